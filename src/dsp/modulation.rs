//! Shared building blocks for time-varying effects: a sine LFO and a
//! fractional delay line.

use std::f64::consts::TAU;

/// Sine low-frequency oscillator, output in -1..1
#[derive(Debug, Clone, Default)]
pub(crate) struct Lfo {
    phase: f64,
    increment: f64,
}

impl Lfo {
    pub(crate) fn prepare(&mut self, rate_hz: f32, sample_rate: f64) {
        self.increment = if sample_rate > 0.0 {
            TAU * rate_hz as f64 / sample_rate
        } else {
            0.0
        };
        self.phase = 0.0;
    }

    pub(crate) fn reset(&mut self) {
        self.phase = 0.0;
    }

    #[inline]
    pub(crate) fn next(&mut self) -> f32 {
        let value = self.phase.sin() as f32;
        self.phase += self.increment;
        if self.phase >= TAU {
            self.phase -= TAU;
        }
        value
    }
}

/// Circular buffer read at fractional delays with linear interpolation
#[derive(Debug, Clone, Default)]
pub(crate) struct FractionalDelay {
    buffer: Vec<f32>,
    write_pos: usize,
}

impl FractionalDelay {
    /// Allocate room for delays up to `max_delay_samples`
    pub(crate) fn new(max_delay_samples: usize) -> Self {
        Self {
            buffer: vec![0.0; max_delay_samples + 2],
            write_pos: 0,
        }
    }

    pub(crate) fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }

    /// Longest delay that can be read back
    pub(crate) fn max_delay(&self) -> f32 {
        self.buffer.len().saturating_sub(2) as f32
    }

    pub(crate) fn push(&mut self, sample: f32) {
        if self.buffer.is_empty() {
            return;
        }
        self.buffer[self.write_pos] = sample;
        self.write_pos = (self.write_pos + 1) % self.buffer.len();
    }

    /// Sample written `delay` samples before the most recent push
    #[inline]
    pub(crate) fn read(&self, delay: f32) -> f32 {
        let len = self.buffer.len();
        if len == 0 {
            return 0.0;
        }
        let delay = delay.clamp(0.0, self.max_delay());
        let whole = delay.floor();
        let frac = delay - whole;
        let newest = (self.write_pos + len - 1) % len;
        let a = self.buffer[(newest + len - whole as usize) % len];
        let b = self.buffer[(newest + len - whole as usize - 1) % len];
        a + (b - a) * frac
    }
}
