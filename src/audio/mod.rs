//! Audio data types
//!
//! Planar processing buffers, the host tensor layout, and WAV file I/O.

pub mod buffer;
pub mod io;
pub mod tensor;

pub use buffer::{db_to_linear, linear_to_db, AudioBuffer, CLIP_LEVEL, DEFAULT_SAMPLE_RATE};
pub use io::{export_wav, import_wav};
pub use tensor::{FrameLayout, Waveform};
