//! Error handling for the pedalboard node
//!
//! Every failure surfaces immediately; nothing is retried or downgraded.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for pedalboard operations
pub type Result<T> = std::result::Result<T, PedalboardError>;

/// Main error type for pedalboard operations
#[derive(Error, Debug)]
pub enum PedalboardError {
    // Input Errors
    #[error("Input audio must be a dictionary")]
    InputNotObject,

    #[error("Input audio must contain 'waveform' key")]
    MissingWaveform,

    #[error("Input audio waveform cannot be None")]
    NullWaveform,

    #[error("Invalid audio shape: {reason}")]
    InvalidShape { reason: String },

    #[error("Invalid sample rate: {value}")]
    InvalidSampleRate { value: String },

    // Preset Errors
    #[error("Preset file {name} not found")]
    PresetNotFound { name: String },

    #[error("Failed to read preset file: {path}")]
    PresetRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid preset file format")]
    InvalidPresetFormat,

    #[error("Effect chain evaluation failed: {reason}")]
    EvaluationFailed { reason: String },

    #[error("Invalid parameter for {effect}: {param} = {value} (expected {expected})")]
    InvalidParameter {
        effect: &'static str,
        param: &'static str,
        value: String,
        expected: String,
    },

    // Processing Errors
    #[error("Audio processing failed: {reason}")]
    ProcessingFailed { reason: String },

    #[error("Tensor conversion failed: {reason}")]
    TensorConversion { reason: String },

    // Audio File Errors
    #[error("Failed to read audio file: {path}")]
    AudioRead {
        path: PathBuf,
        #[source]
        source: hound::Error,
    },

    #[error("Failed to write audio file: {path}")]
    AudioWrite {
        path: PathBuf,
        #[source]
        source: hound::Error,
    },

    #[error("Configuration error: {reason}")]
    Config { reason: String },

    // I/O Errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization Errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PedalboardError {
    /// Shorthand for an evaluation failure with a formatted reason
    pub fn evaluation(reason: impl Into<String>) -> Self {
        PedalboardError::EvaluationFailed {
            reason: reason.into(),
        }
    }

    /// Shorthand for an input shape failure
    pub fn shape(reason: impl Into<String>) -> Self {
        PedalboardError::InvalidShape {
            reason: reason.into(),
        }
    }

    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            PedalboardError::InputNotObject => "INPUT_NOT_OBJECT",
            PedalboardError::MissingWaveform => "MISSING_WAVEFORM",
            PedalboardError::NullWaveform => "NULL_WAVEFORM",
            PedalboardError::InvalidShape { .. } => "INVALID_SHAPE",
            PedalboardError::InvalidSampleRate { .. } => "INVALID_SAMPLE_RATE",
            PedalboardError::PresetNotFound { .. } => "PRESET_NOT_FOUND",
            PedalboardError::PresetRead { .. } => "PRESET_READ",
            PedalboardError::InvalidPresetFormat => "INVALID_PRESET_FORMAT",
            PedalboardError::EvaluationFailed { .. } => "EVALUATION_FAILED",
            PedalboardError::InvalidParameter { .. } => "INVALID_PARAMETER",
            PedalboardError::ProcessingFailed { .. } => "PROCESSING_FAILED",
            PedalboardError::TensorConversion { .. } => "TENSOR_CONVERSION",
            PedalboardError::AudioRead { .. } => "AUDIO_READ",
            PedalboardError::AudioWrite { .. } => "AUDIO_WRITE",
            PedalboardError::Config { .. } => "CONFIG_ERROR",
            PedalboardError::Io(_) => "IO_ERROR",
            PedalboardError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Returns a suggested recovery action for this error
    pub fn recovery_hint(&self) -> &'static str {
        match self {
            Self::InputNotObject | Self::MissingWaveform | Self::NullWaveform => {
                "Connect an AUDIO output carrying 'waveform' and 'sample_rate'"
            }
            Self::InvalidSampleRate { .. } => "Pass sample_rate as a positive integer in Hz",
            Self::InvalidShape { .. } => {
                "Provide audio shaped (samples), (channels, samples) or (1, channels, samples)"
            }
            Self::PresetNotFound { .. } => "Place the .pdl preset in the pedalboard/ folder",
            Self::InvalidPresetFormat => {
                "Expected format: [effects_chain], \"output.wav\""
            }
            Self::EvaluationFailed { .. } | Self::InvalidParameter { .. } => {
                "Use only allow-listed effects with literal arguments"
            }
            Self::ProcessingFailed { .. } => "The effect settings may be too extreme",
            Self::AudioRead { .. } => "Check that the file exists and is a valid WAV file",
            Self::AudioWrite { .. } => "Check the output directory is writable",
            _ => "Check the error details and try again",
        }
    }
}
