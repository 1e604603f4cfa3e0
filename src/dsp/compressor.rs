//! Compressor Effect
//!
//! Per-channel peak envelope follower with attack/release ballistics and a
//! hard-knee gain computer. The same stage is reused twice by the limiter.

use serde::{Deserialize, Serialize};

use crate::audio::{db_to_linear, AudioBuffer};
use crate::dsp::effect::{check_range, time_to_coeff, Effect, EffectParams};
use crate::error::Result;
use crate::impl_effect_common;

/// Compressor parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompressorParams {
    /// Level above which gain reduction starts (dBFS)
    pub threshold_db: f32,
    /// Compression ratio (1 = no compression)
    pub ratio: f32,
    /// Attack time in milliseconds
    pub attack_ms: f32,
    /// Release time in milliseconds
    pub release_ms: f32,
}

impl Default for CompressorParams {
    fn default() -> Self {
        Self {
            threshold_db: 0.0,
            ratio: 1.0,
            attack_ms: 1.0,
            release_ms: 100.0,
        }
    }
}

impl CompressorParams {
    /// Validate all parameters are within range
    pub fn validate(&self) -> Result<()> {
        check_range("Compressor", "threshold_db", self.threshold_db, -100.0, 24.0)?;
        check_range("Compressor", "ratio", self.ratio, 1.0, 1000.0)?;
        check_range("Compressor", "attack_ms", self.attack_ms, 0.0, 10_000.0)?;
        check_range("Compressor", "release_ms", self.release_ms, 0.0, 10_000.0)
    }
}

/// Envelope follower plus gain computer, one envelope per channel
#[derive(Debug, Clone)]
pub(crate) struct DynamicsStage {
    threshold_linear: f32,
    ratio_inverse: f32,
    attack_ms: f32,
    release_ms: f32,
    attack_coeff: f32,
    release_coeff: f32,
    envelope: Vec<f32>,
}

impl DynamicsStage {
    pub(crate) fn new(threshold_db: f32, ratio: f32, attack_ms: f32, release_ms: f32) -> Self {
        Self {
            threshold_linear: db_to_linear(threshold_db),
            ratio_inverse: 1.0 / ratio,
            attack_ms,
            release_ms,
            attack_coeff: 0.0,
            release_coeff: 0.0,
            envelope: Vec::new(),
        }
    }

    pub(crate) fn prepare(&mut self, sample_rate: f64, num_channels: usize) {
        self.attack_coeff = time_to_coeff(self.attack_ms, sample_rate);
        self.release_coeff = time_to_coeff(self.release_ms, sample_rate);
        self.envelope = vec![0.0; num_channels];
    }

    pub(crate) fn reset(&mut self) {
        self.envelope.fill(0.0);
    }

    /// Process one sample of one channel
    #[inline]
    pub(crate) fn process_sample(&mut self, channel: usize, input: f32) -> f32 {
        let level = input.abs();
        let previous = self.envelope[channel];
        let coeff = if level > previous {
            self.attack_coeff
        } else {
            self.release_coeff
        };
        let env = level + coeff * (previous - level);
        self.envelope[channel] = env;

        if env <= self.threshold_linear {
            input
        } else {
            let gain = (env / self.threshold_linear).powf(self.ratio_inverse - 1.0);
            input * gain
        }
    }

    pub(crate) fn process(&mut self, buffer: &mut AudioBuffer) {
        for (ch, channel) in buffer.samples.iter_mut().enumerate() {
            for sample in channel.iter_mut() {
                *sample = self.process_sample(ch, *sample);
            }
        }
    }
}

/// Dynamic range compressor
#[derive(Debug, Clone)]
pub struct Compressor {
    common: EffectParams,
    params: CompressorParams,
    stage: DynamicsStage,
}

impl Compressor {
    /// Create a new compressor with default parameters (a no-op at ratio 1)
    pub fn new() -> Self {
        let params = CompressorParams::default();
        Self {
            common: EffectParams::default(),
            stage: Self::stage_for(&params),
            params,
        }
    }

    /// Create a compressor with custom parameters
    pub fn with_params(params: CompressorParams) -> Result<Self> {
        params.validate()?;
        Ok(Self {
            common: EffectParams::default(),
            stage: Self::stage_for(&params),
            params,
        })
    }

    pub fn params(&self) -> &CompressorParams {
        &self.params
    }

    fn stage_for(params: &CompressorParams) -> DynamicsStage {
        DynamicsStage::new(
            params.threshold_db,
            params.ratio,
            params.attack_ms,
            params.release_ms,
        )
    }
}

impl Default for Compressor {
    fn default() -> Self {
        Self::new()
    }
}

impl Effect for Compressor {
    impl_effect_common!("Compressor");

    fn prepare(&mut self, sample_rate: f64, num_channels: usize) {
        self.stage.prepare(sample_rate, num_channels);
    }

    fn reset(&mut self) {
        self.stage.reset();
    }

    fn process(&mut self, buffer: &mut AudioBuffer) -> Result<()> {
        self.stage.process(buffer);
        Ok(())
    }
}
