//! Phaser Effect
//!
//! Six first-order allpass stages whose break frequency an LFO sweeps
//! around `centre_frequency_hz`. Stage output feeds back into the input and
//! is mixed with the dry signal.

use serde::{Deserialize, Serialize};

use crate::audio::AudioBuffer;
use crate::dsp::effect::{check_range, Effect, EffectParams};
use crate::dsp::filters::OnePole;
use crate::dsp::modulation::Lfo;
use crate::error::Result;
use crate::impl_effect_common;

const NUM_STAGES: usize = 6;
/// Octaves swept either side of the centre at depth 1
const SWEEP_OCTAVES: f32 = 2.0;
const MIN_FREQUENCY_HZ: f32 = 20.0;

/// Phaser parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaserParams {
    pub rate_hz: f32,
    pub depth: f32,
    pub centre_frequency_hz: f32,
    pub feedback: f32,
    pub mix: f32,
}

impl Default for PhaserParams {
    fn default() -> Self {
        Self {
            rate_hz: 1.0,
            depth: 0.5,
            centre_frequency_hz: 1300.0,
            feedback: 0.0,
            mix: 0.5,
        }
    }
}

impl PhaserParams {
    pub fn validate(&self) -> Result<()> {
        check_range("Phaser", "rate_hz", self.rate_hz, 0.0, 100.0)?;
        check_range("Phaser", "depth", self.depth, 0.0, 1.0)?;
        check_range(
            "Phaser",
            "centre_frequency_hz",
            self.centre_frequency_hz,
            MIN_FREQUENCY_HZ,
            1.0e5,
        )?;
        check_range("Phaser", "feedback", self.feedback, -0.95, 0.95)?;
        check_range("Phaser", "mix", self.mix, 0.0, 1.0)
    }
}

/// Swept allpass phaser
#[derive(Debug, Clone)]
pub struct Phaser {
    common: EffectParams,
    params: PhaserParams,
    lfo: Lfo,
    stages: Vec<OnePole>,
    /// Last stage output per channel, for feedback
    last_output: Vec<f32>,
    sample_rate: f64,
}

impl Phaser {
    pub fn with_params(params: PhaserParams) -> Result<Self> {
        params.validate()?;
        Ok(Self::build(params))
    }

    pub fn params(&self) -> &PhaserParams {
        &self.params
    }

    fn build(params: PhaserParams) -> Self {
        Self {
            common: EffectParams::default(),
            params,
            lfo: Lfo::default(),
            stages: vec![OnePole::default(); NUM_STAGES],
            last_output: Vec::new(),
            sample_rate: 0.0,
        }
    }

    fn swept_frequency(&self, modulation: f32) -> f32 {
        let octaves = self.params.depth * SWEEP_OCTAVES * modulation;
        let max = ((self.sample_rate * 0.45) as f32).max(MIN_FREQUENCY_HZ);
        (self.params.centre_frequency_hz * octaves.exp2()).clamp(MIN_FREQUENCY_HZ, max)
    }
}

impl Default for Phaser {
    fn default() -> Self {
        Self::build(PhaserParams::default())
    }
}

impl Effect for Phaser {
    impl_effect_common!("Phaser");

    fn prepare(&mut self, sample_rate: f64, num_channels: usize) {
        self.sample_rate = sample_rate;
        for stage in &mut self.stages {
            stage.prepare(self.params.centre_frequency_hz, sample_rate, num_channels);
        }
        self.last_output = vec![0.0; num_channels];
        self.lfo.prepare(self.params.rate_hz, sample_rate);
    }

    fn reset(&mut self) {
        self.stages.iter_mut().for_each(OnePole::reset);
        self.last_output.fill(0.0);
        self.lfo.reset();
    }

    fn process(&mut self, buffer: &mut AudioBuffer) -> Result<()> {
        let feedback = self.params.feedback;
        let mix = self.params.mix;

        for i in 0..buffer.num_samples() {
            let lfo_value = self.lfo.next();
            let frequency = self.swept_frequency(lfo_value);
            for stage in &mut self.stages {
                stage.set_cutoff(frequency, self.sample_rate);
            }

            for (ch, channel) in buffer.samples.iter_mut().enumerate() {
                let input = channel[i];
                let mut x = input + feedback * self.last_output[ch];
                for stage in &mut self.stages {
                    // First-order allpass from the TPT low-pass: 2 * lp - x
                    x = 2.0 * stage.lowpass(ch, x) - x;
                }
                self.last_output[ch] = x;
                channel[i] = input * (1.0 - mix) + x * mix;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(params: PhaserParams, buffer: &mut AudioBuffer) {
        let mut phaser = Phaser::with_params(params).unwrap();
        phaser.prepare(buffer.sample_rate as f64, buffer.num_channels());
        phaser.reset();
        phaser.process(buffer).unwrap();
    }

    #[test]
    fn test_fully_wet_keeps_energy() {
        // An allpass cascade changes phase, not magnitude
        let input = AudioBuffer::sine_wave(1000.0, 0.5, 0.5, 1, 44100);
        let mut buffer = input.clone();
        run(
            PhaserParams {
                depth: 0.0,
                mix: 1.0,
                ..PhaserParams::default()
            },
            &mut buffer,
        );
        buffer.trim_start(4410);
        let mut reference = input;
        reference.trim_start(4410);
        assert!((buffer.rms_db() - reference.rms_db()).abs() < 0.5);
    }

    #[test]
    fn test_half_mix_notches_centre() {
        let input = AudioBuffer::sine_wave(1300.0, 0.5, 0.5, 1, 44100);
        let mut buffer = input.clone();
        run(
            PhaserParams {
                depth: 0.0,
                ..PhaserParams::default()
            },
            &mut buffer,
        );
        buffer.trim_start(4410);
        let mut reference = input;
        reference.trim_start(4410);
        // Six stages put the centre 540 degrees out of phase
        assert!(buffer.rms_db() < reference.rms_db() - 20.0);
    }

    #[test]
    fn test_sweep_stays_in_band() {
        let mut phaser = Phaser::with_params(PhaserParams {
            depth: 1.0,
            centre_frequency_hz: 15_000.0,
            ..PhaserParams::default()
        })
        .unwrap();
        phaser.prepare(44100.0, 1);
        assert!(phaser.swept_frequency(1.0) <= 44100.0 * 0.45);
        assert!(phaser.swept_frequency(-1.0) >= MIN_FREQUENCY_HZ);
    }

    #[test]
    fn test_parameter_validation() {
        let params = PhaserParams {
            depth: -0.1,
            ..PhaserParams::default()
        };
        assert!(Phaser::with_params(params).is_err());
    }
}
