//! Node configuration
//!
//! Where presets live, what they are called, and where the log goes.
//! Every field has a default so a config file may set only what it needs.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::audio::DEFAULT_SAMPLE_RATE;
use crate::error::{PedalboardError, Result};

/// Default preset subfolder under the node directory
pub const DEFAULT_PRESET_SUBDIR: &str = "pedalboard";

/// Default preset file extension (without the dot)
pub const DEFAULT_PRESET_EXTENSION: &str = "pdl";

/// Default log file name, written next to the node
pub const DEFAULT_LOG_FILE_NAME: &str = "djz_pedalboard.log";

/// Configuration for a [`PedalboardNode`](crate::node::PedalboardNode)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Directory the node is installed in
    pub base_dir: PathBuf,
    /// Preset folder, relative to `base_dir`
    pub preset_subdir: String,
    /// Preset file extension without the leading dot
    pub preset_extension: String,
    /// Log file name, relative to `base_dir`
    pub log_file_name: String,
    /// Sample rate used when the input omits one
    pub default_sample_rate: u32,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from(env!("CARGO_MANIFEST_DIR")),
            preset_subdir: DEFAULT_PRESET_SUBDIR.to_string(),
            preset_extension: DEFAULT_PRESET_EXTENSION.to_string(),
            log_file_name: DEFAULT_LOG_FILE_NAME.to_string(),
            default_sample_rate: DEFAULT_SAMPLE_RATE,
        }
    }
}

impl NodeConfig {
    /// Default configuration rooted at `base_dir`
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            ..Self::default()
        }
    }

    /// Load a JSON config file
    ///
    /// A relative `base_dir` is resolved against the config file's directory.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| PedalboardError::Config {
            reason: format!("cannot read {}: {}", path.display(), e),
        })?;
        let mut config: NodeConfig =
            serde_json::from_str(&text).map_err(|e| PedalboardError::Config {
                reason: format!("invalid config {}: {}", path.display(), e),
            })?;

        if config.base_dir.is_relative() {
            let parent = path.parent().unwrap_or_else(|| Path::new("."));
            config.base_dir = parent.join(&config.base_dir);
        }

        config.validate()?;
        Ok(config)
    }

    /// Check the config is usable
    pub fn validate(&self) -> Result<()> {
        if self.preset_extension.is_empty() || self.preset_extension.starts_with('.') {
            return Err(PedalboardError::Config {
                reason: format!(
                    "preset_extension must be non-empty and without a dot, got '{}'",
                    self.preset_extension
                ),
            });
        }
        if self.default_sample_rate == 0 {
            return Err(PedalboardError::Config {
                reason: "default_sample_rate must be positive".to_string(),
            });
        }
        Ok(())
    }

    /// Absolute preset folder
    pub fn preset_dir(&self) -> PathBuf {
        self.base_dir.join(&self.preset_subdir)
    }

    /// Absolute log file path
    pub fn log_path(&self) -> PathBuf {
        self.base_dir.join(&self.log_file_name)
    }
}
