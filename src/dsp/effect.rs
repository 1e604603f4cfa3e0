//! Effect trait definition
//!
//! Base trait for every effect a preset can name.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::audio::AudioBuffer;
use crate::error::Result;

/// State common to all effect instances
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectParams {
    /// Unique identifier for this effect instance
    pub id: String,
}

impl Default for EffectParams {
    fn default() -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
        }
    }
}

/// Base trait for all effects
///
/// The chain calls `prepare` then `reset` before every buffer, so an effect
/// always starts from silence and the current sample rate.
pub trait Effect: Send + Sync {
    /// Get the unique instance ID
    fn id(&self) -> &str;

    /// Constructor name as written in presets (e.g. "Reverb")
    fn effect_type(&self) -> &'static str;

    /// Size internal state for a sample rate and channel count
    fn prepare(&mut self, sample_rate: f64, num_channels: usize);

    /// Clear delay lines, envelopes and filter history
    fn reset(&mut self);

    /// Process audio in-place
    fn process(&mut self, buffer: &mut AudioBuffer) -> Result<()>;

    /// Current parameters as JSON, keyed by constructor argument name
    fn get_params(&self) -> Value;

    /// Samples of delay the effect adds to its output
    fn latency_samples(&self) -> usize {
        0
    }

    /// Clone the effect into a boxed trait object
    fn box_clone(&self) -> Box<dyn Effect>;

    /// One-line rendering such as `Delay(delay_seconds=0.25, feedback=0.3, mix=0.5)`
    fn describe(&self) -> String {
        let args = match self.get_params() {
            Value::Object(map) => map
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect::<Vec<_>>()
                .join(", "),
            _ => String::new(),
        };
        format!("{}({})", self.effect_type(), args)
    }
}

impl Clone for Box<dyn Effect> {
    fn clone(&self) -> Self {
        self.box_clone()
    }
}

impl std::fmt::Debug for dyn Effect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.describe())
    }
}

/// Helper macro to implement common Effect trait methods
#[macro_export]
macro_rules! impl_effect_common {
    ($effect_type:expr) => {
        fn id(&self) -> &str {
            &self.common.id
        }

        fn effect_type(&self) -> &'static str {
            $effect_type
        }

        fn get_params(&self) -> serde_json::Value {
            serde_json::to_value(&self.params).unwrap_or(serde_json::Value::Null)
        }

        fn box_clone(&self) -> Box<dyn $crate::dsp::Effect> {
            Box::new(self.clone())
        }
    };
}

/// Reject a parameter outside `[min, max]`
pub(crate) fn check_range(
    effect: &'static str,
    param: &'static str,
    value: f32,
    min: f32,
    max: f32,
) -> Result<()> {
    if !value.is_finite() || value < min || value > max {
        return Err(crate::error::PedalboardError::InvalidParameter {
            effect,
            param,
            value: value.to_string(),
            expected: format!("{} to {}", min, max),
        });
    }
    Ok(())
}

/// One-pole smoothing coefficient for a time constant, as JUCE ballistics use
#[inline]
pub(crate) fn time_to_coeff(time_ms: f32, sample_rate: f64) -> f32 {
    if time_ms <= 0.0 || sample_rate <= 0.0 {
        return 0.0;
    }
    (-2.0 * std::f64::consts::PI * 1000.0 / (time_ms as f64 * sample_rate)).exp() as f32
}
