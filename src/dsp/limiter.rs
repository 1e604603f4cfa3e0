//! Limiter Effect
//!
//! Two cascaded compressor stages followed by makeup gain and a hard clip
//! at full scale:
//! 1. Gentle fixed stage: -10 dB, 4:1, 2 ms attack, 200 ms release
//! 2. Brickwall stage at the user threshold: 1000:1, near-instant attack
//!
//! Makeup gain is `-threshold_db`, so the threshold lands at 0 dBFS.

use serde::{Deserialize, Serialize};

use crate::audio::{db_to_linear, AudioBuffer, CLIP_LEVEL};
use crate::dsp::compressor::DynamicsStage;
use crate::dsp::effect::{check_range, Effect, EffectParams};
use crate::error::Result;
use crate::impl_effect_common;

// ============================================================================
// Constants
// ============================================================================

const FIRST_STAGE_THRESHOLD_DB: f32 = -10.0;
const FIRST_STAGE_RATIO: f32 = 4.0;
const FIRST_STAGE_ATTACK_MS: f32 = 2.0;
const FIRST_STAGE_RELEASE_MS: f32 = 200.0;

const SECOND_STAGE_RATIO: f32 = 1000.0;
const SECOND_STAGE_ATTACK_MS: f32 = 0.001;

/// Limiter parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimiterParams {
    /// Brickwall threshold in dBFS
    pub threshold_db: f32,
    /// Release time of the brickwall stage in milliseconds
    pub release_ms: f32,
}

impl Default for LimiterParams {
    fn default() -> Self {
        Self {
            threshold_db: -10.0,
            release_ms: 100.0,
        }
    }
}

impl LimiterParams {
    pub fn validate(&self) -> Result<()> {
        check_range("Limiter", "threshold_db", self.threshold_db, -100.0, 0.0)?;
        check_range("Limiter", "release_ms", self.release_ms, 0.0, 10_000.0)
    }
}

/// Brickwall limiter
#[derive(Debug, Clone)]
pub struct Limiter {
    common: EffectParams,
    params: LimiterParams,
    first_stage: DynamicsStage,
    second_stage: DynamicsStage,
    makeup: f32,
}

impl Limiter {
    pub fn new(threshold_db: f32, release_ms: f32) -> Result<Self> {
        Self::with_params(LimiterParams {
            threshold_db,
            release_ms,
        })
    }

    pub fn with_params(params: LimiterParams) -> Result<Self> {
        params.validate()?;
        Ok(Self::build(params))
    }

    pub fn params(&self) -> &LimiterParams {
        &self.params
    }

    fn build(params: LimiterParams) -> Self {
        Self {
            common: EffectParams::default(),
            first_stage: DynamicsStage::new(
                FIRST_STAGE_THRESHOLD_DB,
                FIRST_STAGE_RATIO,
                FIRST_STAGE_ATTACK_MS,
                FIRST_STAGE_RELEASE_MS,
            ),
            second_stage: DynamicsStage::new(
                params.threshold_db,
                SECOND_STAGE_RATIO,
                SECOND_STAGE_ATTACK_MS,
                params.release_ms,
            ),
            makeup: db_to_linear(-params.threshold_db),
            params,
        }
    }
}

impl Default for Limiter {
    fn default() -> Self {
        Self::build(LimiterParams::default())
    }
}

impl Effect for Limiter {
    impl_effect_common!("Limiter");

    fn prepare(&mut self, sample_rate: f64, num_channels: usize) {
        self.first_stage.prepare(sample_rate, num_channels);
        self.second_stage.prepare(sample_rate, num_channels);
    }

    fn reset(&mut self) {
        self.first_stage.reset();
        self.second_stage.reset();
    }

    fn process(&mut self, buffer: &mut AudioBuffer) -> Result<()> {
        for (ch, channel) in buffer.samples.iter_mut().enumerate() {
            for sample in channel.iter_mut() {
                let stage1 = self.first_stage.process_sample(ch, *sample);
                let stage2 = self.second_stage.process_sample(ch, stage1);
                *sample = (stage2 * self.makeup).clamp(-CLIP_LEVEL, CLIP_LEVEL);
            }
        }
        Ok(())
    }
}
