//! DSP Effects Library
//!
//! Every effect a preset can name. All of them implement the `Effect` trait
//! and run in order inside an `EffectChain`.

mod chain;
mod chorus;
mod compressor;
mod delay;
mod distortion;
mod effect;
mod filters;
mod ladder;
mod limiter;
mod modulation;
mod phaser;
mod pitch_shift;
mod reverb;

pub use chain::EffectChain;
pub use chorus::{Chorus, ChorusParams};
pub use compressor::{Compressor, CompressorParams};
pub use delay::{Delay, DelayParams, MAX_DELAY_SECONDS};
pub use distortion::{Distortion, DistortionParams};
pub use effect::{Effect, EffectParams};
pub use filters::{CutoffParams, HighpassFilter, LowpassFilter};
pub use ladder::{LadderFilter, LadderMode, LadderParams};
pub use limiter::{Limiter, LimiterParams};
pub use phaser::{Phaser, PhaserParams};
pub use pitch_shift::{PitchShift, PitchShiftParams, MAX_SEMITONES, MIN_SEMITONES};
pub use reverb::{Reverb, ReverbParams};
