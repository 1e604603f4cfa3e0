//! Ladder Filter Effect
//!
//! Four cascaded one-pole stages with tanh saturation on the input and in
//! the resonance feedback path. The five stage taps are mixed through a
//! per-mode coefficient row to give 12 and 24 dB/octave low-pass,
//! high-pass and band-pass responses.

use serde::{Deserialize, Serialize};

use crate::audio::AudioBuffer;
use crate::dsp::effect::{check_range, Effect, EffectParams};
use crate::error::Result;
use crate::impl_effect_common;

/// Response shape, written `LadderFilter.Mode.<NAME>` in presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LadderMode {
    #[default]
    Lpf12,
    Hpf12,
    Bpf12,
    Lpf24,
    Hpf24,
    Bpf24,
}

impl LadderMode {
    pub const ALL: [LadderMode; 6] = [
        LadderMode::Lpf12,
        LadderMode::Hpf12,
        LadderMode::Bpf12,
        LadderMode::Lpf24,
        LadderMode::Hpf24,
        LadderMode::Bpf24,
    ];

    pub fn name(self) -> &'static str {
        match self {
            LadderMode::Lpf12 => "LPF12",
            LadderMode::Hpf12 => "HPF12",
            LadderMode::Bpf12 => "BPF12",
            LadderMode::Lpf24 => "LPF24",
            LadderMode::Hpf24 => "HPF24",
            LadderMode::Bpf24 => "BPF24",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|mode| mode.name() == name)
    }

    /// Tap mixing row and feedback input compensation
    fn coefficients(self) -> ([f32; 5], f32) {
        match self {
            LadderMode::Lpf12 => ([0.0, 0.0, 1.0, 0.0, 0.0], 0.5),
            LadderMode::Hpf12 => ([1.0, -2.0, 1.0, 0.0, 0.0], 0.0),
            LadderMode::Bpf12 => ([0.0, 0.0, -1.0, 1.0, 0.0], 0.5),
            LadderMode::Lpf24 => ([0.0, 0.0, 0.0, 0.0, 1.0], 0.5),
            LadderMode::Hpf24 => ([1.0, -4.0, 6.0, -4.0, 1.0], 0.0),
            LadderMode::Bpf24 => ([0.0, 0.0, 1.0, -2.0, 1.0], 0.5),
        }
    }
}

impl std::fmt::Display for LadderMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Ladder filter parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LadderParams {
    pub mode: LadderMode,
    pub cutoff_hz: f32,
    /// 0 to 1; self-oscillation sets in near 1
    pub resonance: f32,
    /// Input drive, 1 or more
    pub drive: f32,
}

impl Default for LadderParams {
    fn default() -> Self {
        Self {
            mode: LadderMode::Lpf12,
            cutoff_hz: 200.0,
            resonance: 0.0,
            drive: 1.0,
        }
    }
}

impl LadderParams {
    pub fn validate(&self) -> Result<()> {
        check_range("LadderFilter", "cutoff_hz", self.cutoff_hz, 0.0, 1.0e6)?;
        check_range("LadderFilter", "resonance", self.resonance, 0.0, 1.0)?;
        check_range("LadderFilter", "drive", self.drive, 1.0, 1000.0)
    }
}

/// Saturating gain compensation curve for a drive amount
fn drive_gain(drive: f32) -> f32 {
    drive.powf(-2.642) * 0.6103 + 0.3903
}

/// Moog-style ladder filter
#[derive(Debug, Clone)]
pub struct LadderFilter {
    common: EffectParams,
    params: LadderParams,
    /// One-pole feedback coefficient, exp(-2π fc / fs)
    a1: f32,
    mix: [f32; 5],
    comp: f32,
    gain: f32,
    drive2: f32,
    gain2: f32,
    scaled_resonance: f32,
    states: Vec<[f32; 5]>,
}

impl LadderFilter {
    pub fn with_params(params: LadderParams) -> Result<Self> {
        params.validate()?;
        Ok(Self::build(params))
    }

    pub fn params(&self) -> &LadderParams {
        &self.params
    }

    pub fn mode(&self) -> LadderMode {
        self.params.mode
    }

    fn build(params: LadderParams) -> Self {
        let (mix, comp) = params.mode.coefficients();
        let drive2 = params.drive * 0.04 + 0.96;
        Self {
            common: EffectParams::default(),
            a1: 0.0,
            mix,
            comp,
            gain: drive_gain(params.drive),
            drive2,
            gain2: drive_gain(drive2),
            // Map 0..1 onto 0.1..1
            scaled_resonance: 0.1 + params.resonance * 0.9,
            states: Vec::new(),
            params,
        }
    }

    #[inline]
    fn process_sample(&mut self, channel: usize, input: f32) -> f32 {
        let a1 = self.a1;
        let g = 1.0 - a1;
        let b0 = g * 0.769_230_77;
        let b1 = g * 0.230_769_23;
        let s = &mut self.states[channel];

        let dx = self.gain * (self.params.drive * input).tanh();
        let fb = self.gain2 * (self.drive2 * s[4]).tanh();
        let a = dx - 4.0 * self.scaled_resonance * (fb - dx * self.comp);
        let b = b1 * s[0] + a1 * s[1] + b0 * a;
        let c = b1 * s[1] + a1 * s[2] + b0 * b;
        let d = b1 * s[2] + a1 * s[3] + b0 * c;
        let e = b1 * s[3] + a1 * s[4] + b0 * d;

        *s = [a, b, c, d, e];
        a * self.mix[0] + b * self.mix[1] + c * self.mix[2] + d * self.mix[3] + e * self.mix[4]
    }
}

impl Default for LadderFilter {
    fn default() -> Self {
        Self::build(LadderParams::default())
    }
}

impl Effect for LadderFilter {
    impl_effect_common!("LadderFilter");

    fn prepare(&mut self, sample_rate: f64, num_channels: usize) {
        let nyquist_guard = sample_rate * 0.499;
        let cutoff = (self.params.cutoff_hz as f64).clamp(0.0, nyquist_guard);
        self.a1 = (-std::f64::consts::TAU * cutoff / sample_rate).exp() as f32;
        self.states = vec![[0.0; 5]; num_channels];
    }

    fn reset(&mut self) {
        self.states.fill([0.0; 5]);
    }

    fn process(&mut self, buffer: &mut AudioBuffer) -> Result<()> {
        for (ch, channel) in buffer.samples.iter_mut().enumerate() {
            for sample in channel.iter_mut() {
                *sample = self.process_sample(ch, *sample);
            }
        }
        Ok(())
    }
}
