//! Effect Chain
//!
//! Ordered sequence of effects applied one after another to a buffer.
//! Order is exactly the order the preset lists them in.

use crate::audio::AudioBuffer;
use crate::dsp::Effect;
use crate::error::{PedalboardError, Result};

/// Ordered chain of effects
#[derive(Clone, Default)]
pub struct EffectChain {
    effects: Vec<Box<dyn Effect>>,
}

impl EffectChain {
    /// Create a new empty effect chain
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a chain from effects in processing order
    pub fn from_effects(effects: Vec<Box<dyn Effect>>) -> Self {
        Self { effects }
    }

    /// Add an effect to the end of the chain
    pub fn push(&mut self, effect: Box<dyn Effect>) {
        self.effects.push(effect);
    }

    /// Process the buffer through every effect in order
    ///
    /// Each effect is prepared for the buffer's rate and channel count and
    /// reset first. Latency an effect reports is trimmed off so the output
    /// stays aligned with the input and keeps its length.
    ///
    /// # Errors
    /// `ProcessingFailed` if an effect fails or leaves NaN/Inf samples behind.
    pub fn process(&mut self, buffer: &mut AudioBuffer) -> Result<()> {
        let sample_rate = buffer.sample_rate as f64;
        let num_channels = buffer.num_channels();

        for effect in &mut self.effects {
            effect.prepare(sample_rate, num_channels);
            effect.reset();

            let latency = effect.latency_samples();
            if latency > 0 {
                buffer.pad_end(latency);
            }

            effect
                .process(buffer)
                .map_err(|e| PedalboardError::ProcessingFailed {
                    reason: format!("{}: {}", effect.effect_type(), e),
                })?;

            if latency > 0 {
                buffer.trim_start(latency);
            }

            if !buffer.is_finite() {
                return Err(PedalboardError::ProcessingFailed {
                    reason: format!("{} produced invalid audio (NaN/Inf)", effect.effect_type()),
                });
            }
        }
        Ok(())
    }

    /// Reset all effects
    pub fn reset(&mut self) {
        for effect in &mut self.effects {
            effect.reset();
        }
    }

    /// Get number of effects in chain
    pub fn len(&self) -> usize {
        self.effects.len()
    }

    /// Check if chain is empty
    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    /// Iterate over effects in processing order
    pub fn iter(&self) -> impl Iterator<Item = &dyn Effect> {
        self.effects.iter().map(|e| e.as_ref())
    }

    /// Effect type names in order
    pub fn effect_types(&self) -> Vec<&'static str> {
        self.effects.iter().map(|e| e.effect_type()).collect()
    }

    /// Effects as JSON: instance id, constructor name and parameters
    pub fn to_json(&self) -> serde_json::Value {
        let effects: Vec<serde_json::Value> = self
            .effects
            .iter()
            .map(|e| {
                serde_json::json!({
                    "id": e.id(),
                    "type": e.effect_type(),
                    "params": e.get_params(),
                })
            })
            .collect();
        serde_json::json!({ "effects": effects })
    }
}

impl std::fmt::Display for EffectChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self.effects.iter().map(|e| e.describe()).collect();
        write!(f, "[{}]", parts.join(", "))
    }
}

impl std::fmt::Debug for EffectChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::{Delay, Distortion, PitchShift};

    #[test]
    fn test_empty_chain_passthrough() {
        let mut buffer = AudioBuffer::sine_wave(440.0, 0.5, 0.1, 2, 44100);
        let original = buffer.clone();

        let mut chain = EffectChain::new();
        chain.process(&mut buffer).unwrap();

        assert_eq!(buffer, original);
    }

    #[test]
    fn test_chain_preserves_length_and_order() {
        let mut buffer = AudioBuffer::sine_wave(220.0, 0.5, 0.2, 2, 48000);
        let original_len = buffer.num_samples();

        let mut chain = EffectChain::new();
        chain.push(Box::new(Distortion::new(12.0).unwrap()));
        chain.push(Box::new(Delay::new(0.05, 0.2, 0.5).unwrap()));
        chain.push(Box::new(PitchShift::new(5.0).unwrap()));
        chain.process(&mut buffer).unwrap();

        assert_eq!(buffer.num_samples(), original_len);
        assert_eq!(chain.effect_types(), vec!["Distortion", "Delay", "PitchShift"]);
        assert!(buffer.is_finite());
    }

    #[test]
    fn test_reprocessing_is_deterministic() {
        let input = AudioBuffer::sine_wave(330.0, 0.5, 0.1, 1, 44100);
        let mut chain = EffectChain::from_effects(vec![Box::new(Delay::new(0.01, 0.5, 0.5).unwrap())]);

        let mut first = input.clone();
        chain.process(&mut first).unwrap();
        let mut second = input.clone();
        chain.process(&mut second).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_display_lists_effects() {
        let chain = EffectChain::from_effects(vec![Box::new(Distortion::new(6.0).unwrap())]);
        assert_eq!(chain.to_string(), "[Distortion(drive_db=6.0)]");
    }

    #[test]
    fn test_to_json_lists_instances() {
        let chain = EffectChain::from_effects(vec![
            Box::new(Distortion::new(6.0).unwrap()),
            Box::new(Distortion::new(6.0).unwrap()),
        ]);
        let json = chain.to_json();
        let effects = json["effects"].as_array().unwrap();

        assert_eq!(effects.len(), 2);
        assert_eq!(effects[0]["type"], "Distortion");
        assert_eq!(effects[0]["params"]["drive_db"], 6.0);
        assert_ne!(effects[0]["id"], effects[1]["id"]);
    }
}
