//! DJZ Pedalboard - preset-driven audio effect chains
//!
//! A node for node-graph media hosts. It takes an audio dictionary and the
//! name of a preset file, pulls the effect chain literal out of the preset,
//! evaluates it against a fixed allow-list of effect constructors, runs the
//! audio through the chain, and peak-normalizes the result.
//!
//! # Layout
//!
//! - [`audio`]: planar buffers, host tensors, WAV I/O
//! - [`dsp`]: the eleven effects and the chain that runs them
//! - [`preset`]: preset lookup, literal extraction, restricted evaluation
//! - [`node`]: the host-facing node and its input/output types
//!
//! # Logging
//!
//! The node appends every step to its log file. To mirror those lines on
//! stderr, a host calls [`logging::init_tracing`] once before processing.

pub mod audio;
pub mod cli;
pub mod config;
pub mod dsp;
pub mod error;
pub mod logging;
pub mod node;
pub mod preset;

pub use audio::{AudioBuffer, Waveform};
pub use config::NodeConfig;
pub use dsp::{Effect, EffectChain};
pub use error::{PedalboardError, Result};
pub use node::{AudioInput, AudioOutput, NodeDescriptor, PedalboardNode};
