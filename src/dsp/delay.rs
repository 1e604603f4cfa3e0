//! Delay Effect
//!
//! Feedback delay line with a dry/wet mix.

use serde::{Deserialize, Serialize};

use crate::audio::AudioBuffer;
use crate::dsp::effect::{check_range, Effect, EffectParams};
use crate::error::Result;
use crate::impl_effect_common;

/// Longest supported delay time in seconds
pub const MAX_DELAY_SECONDS: f32 = 30.0;

/// Delay parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DelayParams {
    /// Delay time in seconds (0 to 30)
    pub delay_seconds: f32,
    /// Portion of the delayed signal fed back into the line (0 to 1)
    pub feedback: f32,
    /// Wet/dry balance: 0 is dry only, 1 is wet only
    pub mix: f32,
}

impl Default for DelayParams {
    fn default() -> Self {
        Self {
            delay_seconds: 0.5,
            feedback: 0.0,
            mix: 0.5,
        }
    }
}

impl DelayParams {
    /// Validate all parameters are within range
    pub fn validate(&self) -> Result<()> {
        check_range("Delay", "delay_seconds", self.delay_seconds, 0.0, MAX_DELAY_SECONDS)?;
        check_range("Delay", "feedback", self.feedback, 0.0, 1.0)?;
        check_range("Delay", "mix", self.mix, 0.0, 1.0)
    }
}

/// Feedback delay
#[derive(Debug, Clone)]
pub struct Delay {
    common: EffectParams,
    params: DelayParams,
    /// Circular buffer per channel, one slot per sample of delay
    lines: Vec<Vec<f32>>,
    /// Shared read/write position
    write_pos: usize,
}

impl Delay {
    pub fn new(delay_seconds: f32, feedback: f32, mix: f32) -> Result<Self> {
        Self::with_params(DelayParams {
            delay_seconds,
            feedback,
            mix,
        })
    }

    pub fn with_params(params: DelayParams) -> Result<Self> {
        params.validate()?;
        Ok(Self {
            common: EffectParams::default(),
            params,
            lines: Vec::new(),
            write_pos: 0,
        })
    }

    pub fn params(&self) -> &DelayParams {
        &self.params
    }
}

impl Default for Delay {
    fn default() -> Self {
        Self {
            common: EffectParams::default(),
            params: DelayParams::default(),
            lines: Vec::new(),
            write_pos: 0,
        }
    }
}

impl Effect for Delay {
    impl_effect_common!("Delay");

    fn prepare(&mut self, sample_rate: f64, num_channels: usize) {
        let delay_samples = (self.params.delay_seconds as f64 * sample_rate).round() as usize;
        self.lines = vec![vec![0.0; delay_samples]; num_channels];
        self.write_pos = 0;
    }

    fn reset(&mut self) {
        for line in &mut self.lines {
            line.fill(0.0);
        }
        self.write_pos = 0;
    }

    fn process(&mut self, buffer: &mut AudioBuffer) -> Result<()> {
        let feedback = self.params.feedback;
        let wet = self.params.mix;
        let dry = 1.0 - wet;

        let delay_len = self.lines.first().map(Vec::len).unwrap_or(0);
        if delay_len == 0 {
            // Zero delay: the wet path is the input itself
            return Ok(());
        }

        let num_samples = buffer.num_samples();
        let start = self.write_pos;
        for (channel, line) in buffer.samples.iter_mut().zip(self.lines.iter_mut()) {
            let mut pos = start;
            for sample in channel.iter_mut().take(num_samples) {
                let input = *sample;
                let delayed = line[pos];
                line[pos] = input + delayed * feedback;
                *sample = input * dry + delayed * wet;
                pos += 1;
                if pos == delay_len {
                    pos = 0;
                }
            }
        }
        self.write_pos = (start + num_samples) % delay_len;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn impulse(len: usize, sample_rate: u32) -> AudioBuffer {
        let mut channel = vec![0.0; len];
        channel[0] = 1.0;
        AudioBuffer::from_channels(vec![channel], sample_rate).unwrap()
    }

    #[test]
    fn test_impulse_echoes_at_delay_time() {
        let mut buffer = impulse(1000, 1000);
        let mut delay = Delay::new(0.1, 0.5, 0.5).unwrap();
        delay.prepare(1000.0, 1);
        delay.process(&mut buffer).unwrap();

        let out = buffer.channel(0);
        assert_relative_eq!(out[0], 0.5);
        assert_relative_eq!(out[100], 0.5);
        // Second echo is attenuated by feedback
        assert_relative_eq!(out[200], 0.25);
        assert_relative_eq!(out[50], 0.0);
    }

    #[test]
    fn test_fully_dry_is_passthrough() {
        let input = AudioBuffer::sine_wave(440.0, 0.5, 0.05, 2, 44100);
        let mut buffer = input.clone();
        let mut delay = Delay::new(0.01, 0.3, 0.0).unwrap();
        delay.prepare(44100.0, 2);
        delay.process(&mut buffer).unwrap();
        assert_eq!(buffer, input);
    }

    #[test]
    fn test_zero_delay_is_identity() {
        let input = AudioBuffer::sine_wave(440.0, 0.5, 0.05, 1, 44100);
        let mut buffer = input.clone();
        let mut delay = Delay::new(0.0, 0.0, 0.7).unwrap();
        delay.prepare(44100.0, 1);
        delay.process(&mut buffer).unwrap();
        assert_eq!(buffer, input);
    }

    #[test]
    fn test_parameter_validation() {
        assert!(Delay::new(-1.0, 0.0, 0.5).is_err());
        assert!(Delay::new(0.5, 1.5, 0.5).is_err());
        assert!(Delay::new(0.5, 0.0, 2.0).is_err());
        assert!(Delay::new(MAX_DELAY_SECONDS, 0.0, 0.5).is_ok());
    }
}
