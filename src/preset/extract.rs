//! Chain literal extraction
//!
//! A preset is free text containing `[<effect calls>], "<output name>"`.
//! Everything around that pair is ignored.

use regex::Regex;

use crate::error::{PedalboardError, Result};

/// Non-greedy: the literal ends at the first `]` followed by `, "name"`
const CHAIN_PATTERN: &str = r#"(?s)(\[.*?\])\s*,\s*"([^"]+)""#;

/// The two pieces a preset carries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainLiteral {
    /// Bracketed effect list, brackets included
    pub chain_source: String,
    /// Output file name the preset was saved with; informational only
    pub output_name: String,
}

/// Compiled preset pattern
#[derive(Debug, Clone)]
pub struct ChainExtractor {
    pattern: Regex,
}

impl ChainExtractor {
    pub fn new() -> Result<Self> {
        let pattern = Regex::new(CHAIN_PATTERN).map_err(|e| PedalboardError::Config {
            reason: format!("preset pattern: {}", e),
        })?;
        Ok(Self { pattern })
    }

    /// Find the first chain literal in `text`
    ///
    /// # Errors
    /// `InvalidPresetFormat` when nothing matches.
    pub fn extract(&self, text: &str) -> Result<ChainLiteral> {
        let captures = self
            .pattern
            .captures(text)
            .ok_or(PedalboardError::InvalidPresetFormat)?;
        match (captures.get(1), captures.get(2)) {
            (Some(chain), Some(output)) => Ok(ChainLiteral {
                chain_source: chain.as_str().to_string(),
                output_name: output.as_str().to_string(),
            }),
            _ => Err(PedalboardError::InvalidPresetFormat),
        }
    }
}
