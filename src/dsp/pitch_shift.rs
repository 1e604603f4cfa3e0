//! Pitch Shift Effect
//!
//! Delay-line pitch shifter. Two read taps sweep through a 50 ms window at
//! a rate set by the pitch ratio, half a window apart, and crossfade with
//! complementary sin² gains so one tap is always silent when it wraps.

use std::f32::consts::PI;

use serde::{Deserialize, Serialize};

use crate::audio::AudioBuffer;
use crate::dsp::effect::{check_range, Effect, EffectParams};
use crate::dsp::modulation::FractionalDelay;
use crate::error::Result;
use crate::impl_effect_common;

pub const MIN_SEMITONES: f32 = -72.0;
pub const MAX_SEMITONES: f32 = 72.0;

const WINDOW_SECONDS: f64 = 0.05;

/// Pitch shift parameters
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PitchShiftParams {
    /// Shift in semitones (-72 to 72)
    pub semitones: f32,
}

/// Duration-preserving pitch shifter
#[derive(Debug, Clone)]
pub struct PitchShift {
    common: EffectParams,
    params: PitchShiftParams,
    lines: Vec<FractionalDelay>,
    window: f32,
    /// Position of the first tap within the window, 0..1
    phase: f32,
}

impl PitchShift {
    pub fn new(semitones: f32) -> Result<Self> {
        check_range("PitchShift", "semitones", semitones, MIN_SEMITONES, MAX_SEMITONES)?;
        Ok(Self {
            common: EffectParams::default(),
            params: PitchShiftParams { semitones },
            lines: Vec::new(),
            window: 0.0,
            phase: 0.0,
        })
    }

    pub fn semitones(&self) -> f32 {
        self.params.semitones
    }

    /// Frequency ratio for the configured shift
    pub fn ratio(&self) -> f32 {
        (self.params.semitones / 12.0).exp2()
    }

    fn is_bypassed(&self) -> bool {
        self.params.semitones == 0.0
    }
}

impl Default for PitchShift {
    fn default() -> Self {
        Self {
            common: EffectParams::default(),
            params: PitchShiftParams::default(),
            lines: Vec::new(),
            window: 0.0,
            phase: 0.0,
        }
    }
}

impl Effect for PitchShift {
    impl_effect_common!("PitchShift");

    fn prepare(&mut self, sample_rate: f64, num_channels: usize) {
        self.window = (sample_rate * WINDOW_SECONDS).round().max(2.0) as f32;
        let capacity = self.window as usize + 1;
        self.lines = (0..num_channels)
            .map(|_| FractionalDelay::new(capacity))
            .collect();
        self.phase = 0.0;
    }

    fn reset(&mut self) {
        self.lines.iter_mut().for_each(FractionalDelay::clear);
        self.phase = 0.0;
    }

    fn latency_samples(&self) -> usize {
        // Taps sit half a window back on average
        if self.is_bypassed() {
            0
        } else {
            (self.window / 2.0) as usize
        }
    }

    fn process(&mut self, buffer: &mut AudioBuffer) -> Result<()> {
        if self.is_bypassed() || self.window <= 0.0 {
            return Ok(());
        }

        let window = self.window;
        let step = (1.0 - self.ratio()) / window;
        let num_samples = buffer.num_samples();
        let start_phase = self.phase;

        for (channel, line) in buffer.samples.iter_mut().zip(self.lines.iter_mut()) {
            let mut phase = start_phase;
            for sample in channel.iter_mut().take(num_samples) {
                line.push(*sample);

                let other = (phase + 0.5).fract();
                let gain_a = (PI * phase).sin().powi(2);
                let gain_b = (PI * other).sin().powi(2);
                *sample = line.read(phase * window) * gain_a + line.read(other * window) * gain_b;

                phase = (phase + step).rem_euclid(1.0);
            }
            self.phase = phase;
        }
        Ok(())
    }
}
