//! DJZ Pedalboard node
//!
//! Host-facing node: takes an audio dictionary and a preset file name, runs
//! the preset's effect chain over the audio, and returns the result in the
//! host tensor layout `(1, channels, samples)`.
//!
//! Every step logs a line; every failure logs an `Error: ...` line and then
//! returns immediately.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;
use serde_json::{json, Value};

use crate::audio::{AudioBuffer, Waveform};
use crate::config::NodeConfig;
use crate::dsp::EffectChain;
use crate::error::{PedalboardError, Result};
use crate::logging::NodeLog;
use crate::preset::{evaluate_chain, ChainExtractor, ChainLiteral, Preset, PresetLibrary};

/// Registry key of the node
pub const NODE_TYPE: &str = "DJZ_Pedalboard";

/// Name shown in the host's node menu
pub const NODE_DISPLAY_NAME: &str = "DJZ_Pedalboard";

const NODE_DESCRIPTION: &str = "Processes audio using a chain of effects defined in an external \
preset file (with .pdl extension) located in the pedalboard/ folder. Select a preset from the \
dropdown to apply its associated effect chain.";

// ============================================================================
// Descriptor
// ============================================================================

/// Static metadata the host reads to register the node
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeDescriptor {
    #[serde(rename = "type")]
    pub node_type: &'static str,
    pub name: &'static str,
    pub category: &'static str,
    pub description: &'static str,
    pub output_type: &'static str,
    pub output_dims: u32,
    #[serde(rename = "RETURN_TYPES")]
    pub return_types: Vec<&'static str>,
    #[serde(rename = "RETURN_NAMES")]
    pub return_names: Vec<&'static str>,
    #[serde(rename = "FUNCTION")]
    pub function: &'static str,
    pub compatible_decorators: Vec<String>,
    pub required_extensions: Vec<String>,
}

impl Default for NodeDescriptor {
    fn default() -> Self {
        Self {
            node_type: NODE_TYPE,
            name: "DJZ Pedalboard Processor",
            category: "Audio",
            description: NODE_DESCRIPTION,
            output_type: "AUDIO",
            output_dims: 1,
            return_types: vec!["AUDIO"],
            return_names: vec!["audio"],
            function: "process",
            compatible_decorators: Vec::new(),
            required_extensions: Vec::new(),
        }
    }
}

/// Node type to descriptor, for host registration
pub fn node_class_mappings() -> BTreeMap<&'static str, NodeDescriptor> {
    BTreeMap::from([(NODE_TYPE, NodeDescriptor::default())])
}

/// Node type to menu label
pub fn node_display_name_mappings() -> BTreeMap<&'static str, &'static str> {
    BTreeMap::from([(NODE_TYPE, NODE_DISPLAY_NAME)])
}

// ============================================================================
// Input / Output
// ============================================================================

/// The host's audio dictionary
#[derive(Debug, Clone, PartialEq)]
pub struct AudioInput {
    pub waveform: Option<Waveform>,
    pub sample_rate: Option<u32>,
}

impl AudioInput {
    pub fn new(waveform: Waveform, sample_rate: u32) -> Self {
        Self {
            waveform: Some(waveform),
            sample_rate: Some(sample_rate),
        }
    }

    /// Read the dictionary form `{"waveform": ..., "sample_rate": ...}`
    ///
    /// # Errors
    /// - `InputNotObject` when `value` is not a JSON object
    /// - `MissingWaveform` when there is no `waveform` key
    /// - `NullWaveform` when `waveform` is null
    /// - `InvalidShape` / `InvalidSampleRate` for unusable values
    pub fn from_value(value: &Value) -> Result<Self> {
        let map = value.as_object().ok_or(PedalboardError::InputNotObject)?;
        let waveform = match map.get("waveform") {
            None => return Err(PedalboardError::MissingWaveform),
            Some(Value::Null) => return Err(PedalboardError::NullWaveform),
            Some(raw) => Waveform::from_value(raw)?,
        };
        let sample_rate = match map.get("sample_rate") {
            None | Some(Value::Null) => None,
            Some(raw) => Some(parse_sample_rate(raw)?),
        };
        Ok(Self {
            waveform: Some(waveform),
            sample_rate,
        })
    }
}

fn parse_sample_rate(raw: &Value) -> Result<u32> {
    let invalid = || PedalboardError::InvalidSampleRate {
        value: raw.to_string(),
    };
    let rate = match raw.as_u64() {
        Some(rate) => rate,
        None => match raw.as_f64() {
            Some(rate) if rate.fract() == 0.0 && rate > 0.0 => rate as u64,
            _ => return Err(invalid()),
        },
    };
    match u32::try_from(rate) {
        Ok(rate) if rate > 0 => Ok(rate),
        _ => Err(invalid()),
    }
}

/// The node's single output
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AudioOutput {
    pub waveform: Waveform,
    pub sample_rate: u32,
    /// Always `None`: the processed audio is not written anywhere
    pub path: Option<PathBuf>,
}

impl AudioOutput {
    /// Dictionary form with the waveform as nested arrays
    pub fn to_value(&self) -> Value {
        json!({
            "waveform": self.waveform.to_nested(),
            "sample_rate": self.sample_rate,
            "path": Value::Null,
        })
    }

    /// Planar buffer view of the output, for writing to disk
    pub fn to_audio_buffer(&self) -> Result<AudioBuffer> {
        self.waveform.to_audio_buffer(self.sample_rate)
    }
}

/// A preset taken apart without processing any audio
#[derive(Debug)]
pub struct PresetReport {
    pub preset: Preset,
    pub literal: ChainLiteral,
    pub chain: EffectChain,
}

// ============================================================================
// Node
// ============================================================================

/// The pedalboard node
///
/// Holds no per-call state; `process` takes `&self` and may run from
/// several threads at once.
#[derive(Debug, Clone)]
pub struct PedalboardNode {
    config: NodeConfig,
    library: PresetLibrary,
    extractor: ChainExtractor,
    log: NodeLog,
}

impl PedalboardNode {
    pub fn new(config: NodeConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            library: PresetLibrary::from_config(&config),
            extractor: ChainExtractor::new()?,
            log: NodeLog::new(config.log_path()),
            config,
        })
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn library(&self) -> &PresetLibrary {
        &self.library
    }

    pub fn log(&self) -> &NodeLog {
        &self.log
    }

    pub fn descriptor(&self) -> NodeDescriptor {
        NodeDescriptor::default()
    }

    /// Input declaration: an AUDIO socket and a dropdown of presets
    pub fn input_types(&self) -> Value {
        json!({
            "required": {
                "audio": ["AUDIO"],
                "effect_presets": [self.library.list()],
            }
        })
    }

    /// Load, extract and evaluate a preset without touching audio
    pub fn inspect_preset(&self, name: &str) -> Result<PresetReport> {
        let preset = self.library.load(name)?;
        let literal = self.extractor.extract(&preset.text)?;
        let chain = evaluate_chain(&literal.chain_source)?;
        Ok(PresetReport {
            preset,
            literal,
            chain,
        })
    }

    /// Process a host dictionary given as JSON
    pub fn process_value(&self, audio: &Value, preset: &str) -> Result<AudioOutput> {
        self.log.line("Starting DJZ_Pedalboard processing...");
        let input = AudioInput::from_value(audio).map_err(|e| {
            let message: String = match &e {
                PedalboardError::InputNotObject => "Error: Input audio is not a dictionary".into(),
                PedalboardError::MissingWaveform => {
                    "Error: Input audio missing 'waveform' key".into()
                }
                PedalboardError::NullWaveform => "Error: Input audio waveform is None".into(),
                other => format!("Error: {}", other),
            };
            self.fail(message, e)
        })?;
        self.run(&input, preset)
    }

    /// Run the preset's chain over `audio`
    ///
    /// # Errors
    /// Input, preset, evaluation, processing and tensor errors, each logged
    /// before it is returned. A missing preset is reported before any
    /// effect runs.
    pub fn process(&self, audio: &AudioInput, preset: &str) -> Result<AudioOutput> {
        self.log.line("Starting DJZ_Pedalboard processing...");
        self.run(audio, preset)
    }

    fn run(&self, audio: &AudioInput, preset_name: &str) -> Result<AudioOutput> {
        let waveform = match &audio.waveform {
            Some(waveform) => waveform,
            None => {
                return Err(self.fail(
                    "Error: Input audio waveform is None".into(),
                    PedalboardError::NullWaveform,
                ))
            }
        };

        let sample_rate = audio.sample_rate.unwrap_or(self.config.default_sample_rate);
        self.log.line(&format!("Using sample rate: {}", sample_rate));

        let mut buffer = waveform
            .to_audio_buffer(sample_rate)
            .map_err(|e| self.fail(format!("Error: {}", e), e))?;
        self.log.line(&format!(
            "Audio data shape after conversion for processing: ({}, {})",
            buffer.num_samples(),
            buffer.num_channels()
        ));

        let preset = self.library.load(preset_name).map_err(|e| {
            let message: String = match &e {
                PedalboardError::PresetNotFound { .. } => format!(
                    "Error: Preset file {} does not exist",
                    self.library.dir().join(preset_name).display()
                ),
                PedalboardError::PresetRead { source, .. } => {
                    format!("Error reading preset file: {}", source)
                }
                other => format!("Error: {}", other),
            };
            self.fail(message, e)
        })?;

        let literal = self.extractor.extract(&preset.text).map_err(|e| {
            self.fail(
                "Error: Preset file format is invalid. Expected format: [effects_chain], \"output.wav\""
                    .into(),
                e,
            )
        })?;
        self.log.line(&format!("Extracted effect chain: {}", literal.chain_source));

        let mut chain = evaluate_chain(&literal.chain_source).map_err(|e| {
            let reason = match &e {
                PedalboardError::EvaluationFailed { reason } => reason.clone(),
                other => other.to_string(),
            };
            self.fail(format!("Error evaluating effect chain: {}", reason), e)
        })?;
        self.log.line(&format!("Evaluated effects list: {}", chain));

        chain.process(&mut buffer).map_err(|e| {
            self.fail(
                format!("Error processing audio through Pedalboard: {}", e),
                e,
            )
        })?;

        let peak = buffer.normalize_peak();
        self.log.line(&format!(
            "Maximum absolute value before normalization: {}",
            peak
        ));

        let waveform = Waveform::from_audio_buffer(&buffer).map_err(|e| {
            self.fail(
                format!("Error converting processed audio to tensor: {}", e),
                e,
            )
        })?;
        self.log.line(&format!(
            "Converted processed audio to tensor with shape {:?}",
            waveform.shape()
        ));

        self.log
            .line("DJZ_Pedalboard processing complete. Returning final output.");
        Ok(AudioOutput {
            waveform,
            sample_rate,
            path: None,
        })
    }

    /// Log the failure, hand the error back for returning
    fn fail(&self, message: String, err: PedalboardError) -> PedalboardError {
        self.log.error(&message);
        err
    }
}
