//! Reverb Effect
//!
//! Freeverb topology:
//! - 8 parallel low-pass feedback comb filters per channel
//! - 4 series allpass filters per channel for diffusion
//! - Stereo width cross-mix when the buffer has two channels
//!
//! Buffers with one or more than two channels run each channel through
//! its own mono tank.

use serde::{Deserialize, Serialize};

use crate::audio::AudioBuffer;
use crate::dsp::effect::{check_range, Effect, EffectParams};
use crate::error::Result;
use crate::impl_effect_common;

// ============================================================================
// Freeverb Constants
// ============================================================================

/// Sample rate the tuning tables are specified at
const REFERENCE_SAMPLE_RATE: f64 = 44100.0;

const COMB_TUNING: [usize; 8] = [1116, 1188, 1277, 1356, 1422, 1491, 1557, 1617];
const ALLPASS_TUNING: [usize; 4] = [556, 441, 341, 225];

/// Extra samples added to right channel tunings
const STEREO_SPREAD: usize = 23;

const FIXED_GAIN: f32 = 0.015;
const ROOM_SCALE: f32 = 0.28;
const ROOM_OFFSET: f32 = 0.7;
const DAMP_SCALE: f32 = 0.4;
const WET_SCALE: f32 = 3.0;
const DRY_SCALE: f32 = 2.0;

/// `freeze_mode` at or above this value holds the tail indefinitely
const FREEZE_THRESHOLD: f32 = 0.5;

// ============================================================================
// Parameters
// ============================================================================

/// Reverb parameters, all normalised to 0..1
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReverbParams {
    pub room_size: f32,
    pub damping: f32,
    pub wet_level: f32,
    pub dry_level: f32,
    pub width: f32,
    pub freeze_mode: f32,
}

impl Default for ReverbParams {
    fn default() -> Self {
        Self {
            room_size: 0.5,
            damping: 0.5,
            wet_level: 0.33,
            dry_level: 0.4,
            width: 1.0,
            freeze_mode: 0.0,
        }
    }
}

impl ReverbParams {
    /// Validate all parameters are within range
    pub fn validate(&self) -> Result<()> {
        check_range("Reverb", "room_size", self.room_size, 0.0, 1.0)?;
        check_range("Reverb", "damping", self.damping, 0.0, 1.0)?;
        check_range("Reverb", "wet_level", self.wet_level, 0.0, 1.0)?;
        check_range("Reverb", "dry_level", self.dry_level, 0.0, 1.0)?;
        check_range("Reverb", "width", self.width, 0.0, 1.0)?;
        check_range("Reverb", "freeze_mode", self.freeze_mode, 0.0, 1.0)
    }

    fn is_frozen(&self) -> bool {
        self.freeze_mode >= FREEZE_THRESHOLD
    }
}

// ============================================================================
// Filter Components
// ============================================================================

/// Comb filter with a one-pole low-pass in the feedback path
#[derive(Debug, Clone)]
struct CombFilter {
    buffer: Vec<f32>,
    index: usize,
    last: f32,
}

impl CombFilter {
    fn new(size: usize) -> Self {
        Self {
            buffer: vec![0.0; size.max(1)],
            index: 0,
            last: 0.0,
        }
    }

    #[inline]
    fn process(&mut self, input: f32, damp: f32, feedback: f32) -> f32 {
        let output = self.buffer[self.index];
        self.last = output * (1.0 - damp) + self.last * damp;
        self.buffer[self.index] = input + self.last * feedback;
        self.index += 1;
        if self.index == self.buffer.len() {
            self.index = 0;
        }
        output
    }

    fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.index = 0;
        self.last = 0.0;
    }
}

/// Schroeder allpass with fixed 0.5 feedback
#[derive(Debug, Clone)]
struct AllpassFilter {
    buffer: Vec<f32>,
    index: usize,
}

impl AllpassFilter {
    fn new(size: usize) -> Self {
        Self {
            buffer: vec![0.0; size.max(1)],
            index: 0,
        }
    }

    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let buffered = self.buffer[self.index];
        self.buffer[self.index] = input + buffered * 0.5;
        self.index += 1;
        if self.index == self.buffer.len() {
            self.index = 0;
        }
        buffered - input
    }

    fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.index = 0;
    }
}

/// Combs and allpasses for one output channel
#[derive(Debug, Clone)]
struct Tank {
    combs: Vec<CombFilter>,
    allpasses: Vec<AllpassFilter>,
}

impl Tank {
    fn new(sample_rate: f64, spread: usize) -> Self {
        let scale = sample_rate / REFERENCE_SAMPLE_RATE;
        let scaled = |tuning: usize| ((tuning + spread) as f64 * scale) as usize;
        Self {
            combs: COMB_TUNING.iter().map(|&t| CombFilter::new(scaled(t))).collect(),
            allpasses: ALLPASS_TUNING
                .iter()
                .map(|&t| AllpassFilter::new(scaled(t)))
                .collect(),
        }
    }

    #[inline]
    fn process(&mut self, input: f32, damp: f32, feedback: f32) -> f32 {
        let mut output = 0.0;
        for comb in &mut self.combs {
            output += comb.process(input, damp, feedback);
        }
        for allpass in &mut self.allpasses {
            output = allpass.process(output);
        }
        output
    }

    fn clear(&mut self) {
        self.combs.iter_mut().for_each(CombFilter::clear);
        self.allpasses.iter_mut().for_each(AllpassFilter::clear);
    }
}

// ============================================================================
// Main Reverb Effect
// ============================================================================

/// Algorithmic room reverb
#[derive(Debug, Clone)]
pub struct Reverb {
    common: EffectParams,
    params: ReverbParams,
    tanks: Vec<Tank>,
}

impl Reverb {
    /// Create a reverb with default parameters
    pub fn new() -> Self {
        Self {
            common: EffectParams::default(),
            params: ReverbParams::default(),
            tanks: Vec::new(),
        }
    }

    /// Create a reverb with validated parameters
    pub fn with_params(params: ReverbParams) -> Result<Self> {
        params.validate()?;
        Ok(Self {
            common: EffectParams::default(),
            params,
            tanks: Vec::new(),
        })
    }

    pub fn params(&self) -> &ReverbParams {
        &self.params
    }

    /// (input gain, comb damping, comb feedback) for the current settings
    fn tank_coefficients(&self) -> (f32, f32, f32) {
        if self.params.is_frozen() {
            (0.0, 0.0, 1.0)
        } else {
            (
                FIXED_GAIN,
                self.params.damping * DAMP_SCALE,
                self.params.room_size * ROOM_SCALE + ROOM_OFFSET,
            )
        }
    }

    /// (wet1, wet2, dry) output gains
    fn mix_gains(&self) -> (f32, f32, f32) {
        let wet = self.params.wet_level * WET_SCALE;
        let width = self.params.width;
        (
            0.5 * wet * (1.0 + width),
            0.5 * wet * (1.0 - width),
            self.params.dry_level * DRY_SCALE,
        )
    }

    fn process_stereo(&mut self, buffer: &mut AudioBuffer) {
        let (gain, damp, feedback) = self.tank_coefficients();
        let (wet1, wet2, dry) = self.mix_gains();
        let (left_tank, right_tank) = self.tanks.split_at_mut(1);
        let (left_tank, right_tank) = (&mut left_tank[0], &mut right_tank[0]);
        let (left, right) = buffer.samples.split_at_mut(1);

        for (l, r) in left[0].iter_mut().zip(right[0].iter_mut()) {
            let input = (*l + *r) * gain;
            let out_l = left_tank.process(input, damp, feedback);
            let out_r = right_tank.process(input, damp, feedback);
            *l = out_l * wet1 + out_r * wet2 + *l * dry;
            *r = out_r * wet1 + out_l * wet2 + *r * dry;
        }
    }

    fn process_mono(&mut self, buffer: &mut AudioBuffer) {
        let (gain, damp, feedback) = self.tank_coefficients();
        let (wet1, _, dry) = self.mix_gains();

        for (channel, tank) in buffer.samples.iter_mut().zip(self.tanks.iter_mut()) {
            for sample in channel.iter_mut() {
                let out = tank.process(*sample * gain, damp, feedback);
                *sample = out * wet1 + *sample * dry;
            }
        }
    }
}

impl Default for Reverb {
    fn default() -> Self {
        Self::new()
    }
}

impl Effect for Reverb {
    impl_effect_common!("Reverb");

    fn prepare(&mut self, sample_rate: f64, num_channels: usize) {
        self.tanks = if num_channels == 2 {
            vec![Tank::new(sample_rate, 0), Tank::new(sample_rate, STEREO_SPREAD)]
        } else {
            (0..num_channels).map(|_| Tank::new(sample_rate, 0)).collect()
        };
    }

    fn reset(&mut self) {
        self.tanks.iter_mut().for_each(Tank::clear);
    }

    fn process(&mut self, buffer: &mut AudioBuffer) -> Result<()> {
        if self.tanks.len() != buffer.num_channels() {
            self.prepare(buffer.sample_rate as f64, buffer.num_channels());
        }
        if buffer.num_channels() == 2 {
            self.process_stereo(buffer);
        } else {
            self.process_mono(buffer);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn impulse(num_channels: usize, len: usize) -> AudioBuffer {
        let mut buffer = AudioBuffer::new(num_channels, len, 44100);
        for ch in 0..num_channels {
            buffer.channel_mut(ch)[0] = 1.0;
        }
        buffer
    }

    fn run(params: ReverbParams, buffer: &mut AudioBuffer) {
        let mut reverb = Reverb::with_params(params).unwrap();
        reverb.prepare(buffer.sample_rate as f64, buffer.num_channels());
        reverb.reset();
        reverb.process(buffer).unwrap();
    }

    #[test]
    fn test_produces_tail() {
        let mut buffer = impulse(2, 44100);
        run(ReverbParams::default(), &mut buffer);
        // Energy arrives after the shortest comb delay
        let tail: f32 = buffer.channel(0)[2000..].iter().map(|s| s.abs()).sum();
        assert!(tail > 0.01, "no reverb tail: {}", tail);
        assert!(buffer.is_finite());
    }

    #[test]
    fn test_dry_only_scales_input() {
        let mut buffer = impulse(1, 4096);
        run(
            ReverbParams {
                wet_level: 0.0,
                dry_level: 0.25,
                ..ReverbParams::default()
            },
            &mut buffer,
        );
        assert_relative_eq!(buffer.channel(0)[0], 0.5);
        assert!(buffer.channel(0)[1..].iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_frozen_tank_ignores_new_input() {
        let mut buffer = impulse(1, 8192);
        run(
            ReverbParams {
                freeze_mode: 1.0,
                dry_level: 0.0,
                ..ReverbParams::default()
            },
            &mut buffer,
        );
        // Input gain is zero while frozen, so an empty tank stays silent
        assert_eq!(buffer.peak(), 0.0);
    }

    #[test]
    fn test_multichannel_runs_mono_tanks() {
        let mut buffer = impulse(3, 8192);
        run(ReverbParams::default(), &mut buffer);
        assert_eq!(buffer.num_channels(), 3);
        assert_eq!(buffer.channel(0), buffer.channel(2));
    }

    #[test]
    fn test_parameter_validation() {
        let params = ReverbParams {
            room_size: 1.5,
            ..ReverbParams::default()
        };
        assert!(Reverb::with_params(params).is_err());
    }
}
