//! Distortion Effect
//!
//! Drive gain into a tanh waveshaper.

use serde::{Deserialize, Serialize};

use crate::audio::{db_to_linear, AudioBuffer};
use crate::dsp::effect::{check_range, Effect, EffectParams};
use crate::error::Result;
use crate::impl_effect_common;

/// Distortion parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistortionParams {
    /// Gain applied before the waveshaper, in dB
    pub drive_db: f32,
}

impl Default for DistortionParams {
    fn default() -> Self {
        Self { drive_db: 25.0 }
    }
}

/// Soft-clipping distortion: `tanh(x * gain(drive_db))`
#[derive(Debug, Clone)]
pub struct Distortion {
    common: EffectParams,
    params: DistortionParams,
    drive_linear: f32,
}

impl Distortion {
    pub fn new(drive_db: f32) -> Result<Self> {
        check_range("Distortion", "drive_db", drive_db, -100.0, 100.0)?;
        Ok(Self {
            common: EffectParams::default(),
            params: DistortionParams { drive_db },
            drive_linear: db_to_linear(drive_db),
        })
    }

    pub fn drive_db(&self) -> f32 {
        self.params.drive_db
    }
}

impl Default for Distortion {
    fn default() -> Self {
        let params = DistortionParams::default();
        Self {
            common: EffectParams::default(),
            drive_linear: db_to_linear(params.drive_db),
            params,
        }
    }
}

impl Effect for Distortion {
    impl_effect_common!("Distortion");

    fn prepare(&mut self, _sample_rate: f64, _num_channels: usize) {}

    fn reset(&mut self) {
        // Stateless
    }

    fn process(&mut self, buffer: &mut AudioBuffer) -> Result<()> {
        let gain = self.drive_linear;
        for channel in &mut buffer.samples {
            for sample in channel.iter_mut() {
                *sample = (*sample * gain).tanh();
            }
        }
        Ok(())
    }
}
