//! First-order high-pass and low-pass filters
//!
//! Topology-preserving transform (TPT) one-pole, 6 dB/octave roll-off,
//! -3 dB at the cutoff frequency.

use serde::{Deserialize, Serialize};

use crate::audio::AudioBuffer;
use crate::dsp::effect::{check_range, Effect, EffectParams};
use crate::error::Result;
use crate::impl_effect_common;

/// Cutoff parameter shared by both filters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CutoffParams {
    /// Cutoff frequency in Hz
    pub cutoff_frequency_hz: f32,
}

impl Default for CutoffParams {
    fn default() -> Self {
        Self {
            cutoff_frequency_hz: 50.0,
        }
    }
}

/// One TPT integrator per channel
///
/// `process` returns the low-pass output; high-pass is `input - lowpass`.
#[derive(Debug, Clone, Default)]
pub(crate) struct OnePole {
    g: f32,
    states: Vec<f32>,
}

impl OnePole {
    pub(crate) fn prepare(&mut self, cutoff_hz: f32, sample_rate: f64, num_channels: usize) {
        self.set_cutoff(cutoff_hz, sample_rate);
        self.states = vec![0.0; num_channels];
    }

    pub(crate) fn set_cutoff(&mut self, cutoff_hz: f32, sample_rate: f64) {
        let nyquist_guard = (sample_rate * 0.499).max(1.0);
        let fc = (cutoff_hz as f64).clamp(1.0, nyquist_guard);
        let big_g = (std::f64::consts::PI * fc / sample_rate).tan();
        self.g = (big_g / (1.0 + big_g)) as f32;
    }

    pub(crate) fn reset(&mut self) {
        self.states.fill(0.0);
    }

    #[inline]
    pub(crate) fn lowpass(&mut self, channel: usize, input: f32) -> f32 {
        let state = &mut self.states[channel];
        let v = (input - *state) * self.g;
        let output = v + *state;
        *state = output + v;
        output
    }
}

macro_rules! first_order_filter {
    ($name:ident, $label:expr, $doc:expr, |$input:ident, $lp:ident| $out:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone)]
        pub struct $name {
            common: EffectParams,
            params: CutoffParams,
            filter: OnePole,
        }

        impl $name {
            pub fn new(cutoff_frequency_hz: f32) -> Result<Self> {
                check_range($label, "cutoff_frequency_hz", cutoff_frequency_hz, 0.0, 1.0e6)?;
                Ok(Self {
                    common: EffectParams::default(),
                    params: CutoffParams {
                        cutoff_frequency_hz,
                    },
                    filter: OnePole::default(),
                })
            }

            pub fn cutoff_frequency_hz(&self) -> f32 {
                self.params.cutoff_frequency_hz
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self {
                    common: EffectParams::default(),
                    params: CutoffParams::default(),
                    filter: OnePole::default(),
                }
            }
        }

        impl Effect for $name {
            impl_effect_common!($label);

            fn prepare(&mut self, sample_rate: f64, num_channels: usize) {
                self.filter
                    .prepare(self.params.cutoff_frequency_hz, sample_rate, num_channels);
            }

            fn reset(&mut self) {
                self.filter.reset();
            }

            fn process(&mut self, buffer: &mut AudioBuffer) -> Result<()> {
                for (ch, channel) in buffer.samples.iter_mut().enumerate() {
                    for sample in channel.iter_mut() {
                        let $input = *sample;
                        let $lp = self.filter.lowpass(ch, $input);
                        *sample = $out;
                    }
                }
                Ok(())
            }
        }
    };
}

first_order_filter!(
    HighpassFilter,
    "HighpassFilter",
    "First-order high-pass filter (6 dB/octave)",
    |input, lowpass| input - lowpass
);

first_order_filter!(
    LowpassFilter,
    "LowpassFilter",
    "First-order low-pass filter (6 dB/octave)",
    |input, lowpass| lowpass
);
