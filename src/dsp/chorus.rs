//! Chorus Effect
//!
//! A sine LFO sweeps a short delay around `centre_delay_ms`; the modulated
//! copy is mixed back with the dry signal.

use serde::{Deserialize, Serialize};

use crate::audio::AudioBuffer;
use crate::dsp::effect::{check_range, Effect, EffectParams};
use crate::dsp::modulation::{FractionalDelay, Lfo};
use crate::error::Result;
use crate::impl_effect_common;

/// Delay swing at depth 1, in milliseconds
const MAX_MODULATION_MS: f32 = 20.0;
const MAX_CENTRE_DELAY_MS: f32 = 100.0;

/// Chorus parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChorusParams {
    /// LFO rate in Hz
    pub rate_hz: f32,
    /// Modulation depth (0 to 1)
    pub depth: f32,
    /// Delay the LFO sweeps around, in milliseconds
    pub centre_delay_ms: f32,
    /// Feedback of the modulated line (-1 to 1, exclusive)
    pub feedback: f32,
    /// Wet/dry balance
    pub mix: f32,
}

impl Default for ChorusParams {
    fn default() -> Self {
        Self {
            rate_hz: 1.0,
            depth: 0.25,
            centre_delay_ms: 7.0,
            feedback: 0.0,
            mix: 0.5,
        }
    }
}

impl ChorusParams {
    pub fn validate(&self) -> Result<()> {
        check_range("Chorus", "rate_hz", self.rate_hz, 0.0, 100.0)?;
        check_range("Chorus", "depth", self.depth, 0.0, 1.0)?;
        check_range("Chorus", "centre_delay_ms", self.centre_delay_ms, 0.0, MAX_CENTRE_DELAY_MS)?;
        check_range("Chorus", "feedback", self.feedback, -0.95, 0.95)?;
        check_range("Chorus", "mix", self.mix, 0.0, 1.0)
    }
}

/// Modulated-delay chorus
#[derive(Debug, Clone)]
pub struct Chorus {
    common: EffectParams,
    params: ChorusParams,
    lfo: Lfo,
    lines: Vec<FractionalDelay>,
    samples_per_ms: f32,
}

impl Chorus {
    pub fn with_params(params: ChorusParams) -> Result<Self> {
        params.validate()?;
        Ok(Self {
            common: EffectParams::default(),
            params,
            lfo: Lfo::default(),
            lines: Vec::new(),
            samples_per_ms: 0.0,
        })
    }

    pub fn params(&self) -> &ChorusParams {
        &self.params
    }
}

impl Default for Chorus {
    fn default() -> Self {
        Self {
            common: EffectParams::default(),
            params: ChorusParams::default(),
            lfo: Lfo::default(),
            lines: Vec::new(),
            samples_per_ms: 0.0,
        }
    }
}

impl Effect for Chorus {
    impl_effect_common!("Chorus");

    fn prepare(&mut self, sample_rate: f64, num_channels: usize) {
        self.samples_per_ms = (sample_rate / 1000.0) as f32;
        let max_ms = MAX_CENTRE_DELAY_MS + MAX_MODULATION_MS;
        let capacity = (max_ms * self.samples_per_ms).ceil() as usize + 1;
        self.lines = (0..num_channels)
            .map(|_| FractionalDelay::new(capacity))
            .collect();
        self.lfo.prepare(self.params.rate_hz, sample_rate);
    }

    fn reset(&mut self) {
        self.lines.iter_mut().for_each(FractionalDelay::clear);
        self.lfo.reset();
    }

    fn process(&mut self, buffer: &mut AudioBuffer) -> Result<()> {
        let ChorusParams {
            depth,
            centre_delay_ms,
            feedback,
            mix,
            ..
        } = self.params;
        let num_samples = buffer.num_samples();

        // All channels share one LFO so the image stays centred
        for i in 0..num_samples {
            let modulation = self.lfo.next();
            let delay_ms = centre_delay_ms + depth * MAX_MODULATION_MS * modulation;
            let delay = (delay_ms * self.samples_per_ms).max(1.0);

            for (channel, line) in buffer.samples.iter_mut().zip(self.lines.iter_mut()) {
                let input = channel[i];
                // One-sample offset: the read happens before this input is pushed
                let delayed = line.read(delay - 1.0);
                line.push(input + delayed * feedback);
                channel[i] = input * (1.0 - mix) + delayed * mix;
            }
        }
        Ok(())
    }
}
