//! Audio Buffer Management
//!
//! Planar audio buffer used by every effect in the chain.

use crate::error::{PedalboardError, Result};

/// Sample rate assumed when the host does not supply one
pub const DEFAULT_SAMPLE_RATE: u32 = 44100;

/// Peak level above which output is rescaled
pub const CLIP_LEVEL: f32 = 1.0;

/// Convert decibels to linear amplitude
#[inline]
pub fn db_to_linear(db: f32) -> f32 {
    10.0_f32.powf(db / 20.0)
}

/// Convert linear amplitude to decibels
///
/// Returns -f32::INFINITY for zero input.
#[inline]
pub fn linear_to_db(linear: f32) -> f32 {
    if linear <= 0.0 {
        f32::NEG_INFINITY
    } else {
        20.0 * linear.log10()
    }
}

/// Core audio buffer type
///
/// Stores audio as non-interleaved 32-bit floating point samples.
/// Each channel is a separate `Vec<f32>` of equal length.
///
/// # Example
/// ```
/// use pedalboard_node::audio::AudioBuffer;
///
/// let buffer = AudioBuffer::new(2, 44100, 44100);
/// assert_eq!(buffer.num_channels(), 2);
/// assert_eq!(buffer.num_samples(), 44100);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    /// Sample data: outer Vec is channels, inner Vec is samples
    pub samples: Vec<Vec<f32>>,
    /// Sample rate in Hz
    pub sample_rate: u32,
}

impl AudioBuffer {
    /// Create a silent buffer
    pub fn new(num_channels: usize, num_samples: usize, sample_rate: u32) -> Self {
        Self {
            samples: vec![vec![0.0_f32; num_samples]; num_channels],
            sample_rate,
        }
    }

    /// Create a buffer from per-channel sample vectors
    ///
    /// All channels must have the same length.
    pub fn from_channels(samples: Vec<Vec<f32>>, sample_rate: u32) -> Result<Self> {
        if let Some(first) = samples.first() {
            let len = first.len();
            if let Some(bad) = samples.iter().position(|ch| ch.len() != len) {
                return Err(PedalboardError::shape(format!(
                    "channel {} has {} samples, expected {}",
                    bad,
                    samples[bad].len(),
                    len
                )));
            }
        }
        Ok(Self {
            samples,
            sample_rate,
        })
    }

    /// Create an audio buffer from interleaved (samples, channels) data
    pub fn from_interleaved(
        interleaved: &[f32],
        num_channels: usize,
        sample_rate: u32,
    ) -> Result<Self> {
        if num_channels == 0 {
            return Err(PedalboardError::shape("channel count must be at least 1"));
        }

        if interleaved.len() % num_channels != 0 {
            return Err(PedalboardError::shape(format!(
                "interleaved data length {} is not divisible by channel count {}",
                interleaved.len(),
                num_channels
            )));
        }

        let num_samples = interleaved.len() / num_channels;
        let mut samples = vec![Vec::with_capacity(num_samples); num_channels];

        for frame in interleaved.chunks_exact(num_channels) {
            for (ch, &sample) in frame.iter().enumerate() {
                samples[ch].push(sample);
            }
        }

        Ok(Self {
            samples,
            sample_rate,
        })
    }

    /// Convert the buffer to interleaved format (L, R, L, R, ...)
    pub fn to_interleaved(&self) -> Vec<f32> {
        let num_channels = self.num_channels();
        let num_samples = self.num_samples();

        let mut interleaved = Vec::with_capacity(num_channels * num_samples);
        for sample_idx in 0..num_samples {
            for channel in &self.samples {
                interleaved.push(channel[sample_idx]);
            }
        }
        interleaved
    }

    /// Generate a sine wave, mainly for tests and fixtures
    pub fn sine_wave(
        frequency: f32,
        amplitude: f32,
        duration_secs: f32,
        num_channels: usize,
        sample_rate: u32,
    ) -> Self {
        let num_samples = (duration_secs * sample_rate as f32) as usize;
        let channel: Vec<f32> = (0..num_samples)
            .map(|i| {
                let t = i as f32 / sample_rate as f32;
                amplitude * (2.0 * std::f32::consts::PI * frequency * t).sin()
            })
            .collect();
        Self {
            samples: vec![channel; num_channels],
            sample_rate,
        }
    }

    /// Get the number of channels
    #[inline]
    pub fn num_channels(&self) -> usize {
        self.samples.len()
    }

    /// Get the number of samples per channel
    #[inline]
    pub fn num_samples(&self) -> usize {
        self.samples.first().map(|ch| ch.len()).unwrap_or(0)
    }

    /// Check if the buffer holds no samples
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.num_samples() == 0
    }

    /// Duration in seconds
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.num_samples() as f64 / self.sample_rate as f64
    }

    /// Immutable access to a channel's samples
    ///
    /// # Panics
    /// Panics if the channel index is out of bounds
    #[inline]
    pub fn channel(&self, index: usize) -> &[f32] {
        &self.samples[index]
    }

    /// Mutable access to a channel's samples
    ///
    /// # Panics
    /// Panics if the channel index is out of bounds
    #[inline]
    pub fn channel_mut(&mut self, index: usize) -> &mut [f32] {
        &mut self.samples[index]
    }

    /// Iterate over every sample of every channel
    pub fn iter_samples(&self) -> impl Iterator<Item = f32> + '_ {
        self.samples.iter().flat_map(|ch| ch.iter().copied())
    }

    /// Largest absolute sample value across all channels
    pub fn peak(&self) -> f32 {
        self.iter_samples().map(f32::abs).fold(0.0_f32, f32::max)
    }

    /// Peak level in dBFS
    pub fn peak_db(&self) -> f32 {
        linear_to_db(self.peak())
    }

    /// RMS level in dBFS across all channels
    pub fn rms_db(&self) -> f32 {
        let total = self.num_channels() * self.num_samples();
        if total == 0 {
            return f32::NEG_INFINITY;
        }
        let sum_squares: f64 = self.iter_samples().map(|s| (s as f64) * (s as f64)).sum();
        linear_to_db((sum_squares / total as f64).sqrt() as f32)
    }

    /// Check if all samples are finite (not NaN or Infinity)
    pub fn is_finite(&self) -> bool {
        self.iter_samples().all(f32::is_finite)
    }

    /// Rescale so the peak sits at `CLIP_LEVEL` when it exceeds it
    ///
    /// Returns the peak measured before rescaling.
    pub fn normalize_peak(&mut self) -> f32 {
        let peak = self.peak();
        if peak > CLIP_LEVEL {
            // Divide rather than multiply by 1/peak: x / peak never exceeds 1
            for channel in &mut self.samples {
                for sample in channel.iter_mut() {
                    *sample /= peak;
                }
            }
        }
        peak
    }

    /// Append `count` samples of silence to every channel
    pub fn pad_end(&mut self, count: usize) {
        for channel in &mut self.samples {
            channel.resize(channel.len() + count, 0.0);
        }
    }

    /// Drop the first `count` samples of every channel
    pub fn trim_start(&mut self, count: usize) {
        for channel in &mut self.samples {
            let n = count.min(channel.len());
            channel.drain(..n);
        }
    }
}

impl Default for AudioBuffer {
    fn default() -> Self {
        Self::new(1, 0, DEFAULT_SAMPLE_RATE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_new_buffer() {
        let buf = AudioBuffer::new(2, 1000, 44100);
        assert_eq!(buf.num_channels(), 2);
        assert_eq!(buf.num_samples(), 1000);
        assert!(buf.iter_samples().all(|s| s == 0.0));
    }

    #[test]
    fn test_interleave_deinterleave() {
        let data = [0.1, -0.1, 0.2, -0.2, 0.3, -0.3];
        let buf = AudioBuffer::from_interleaved(&data, 2, 48000).unwrap();
        assert_eq!(buf.channel(0), &[0.1, 0.2, 0.3]);
        assert_eq!(buf.channel(1), &[-0.1, -0.2, -0.3]);
        assert_eq!(buf.to_interleaved(), data.to_vec());
    }

    #[test]
    fn test_from_interleaved_rejects_ragged_length() {
        let err = AudioBuffer::from_interleaved(&[0.0; 5], 2, 44100).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_SHAPE");
    }

    #[test]
    fn test_from_channels_rejects_unequal_lengths() {
        let result = AudioBuffer::from_channels(vec![vec![0.0; 4], vec![0.0; 3]], 44100);
        assert!(result.is_err());
    }

    #[test]
    fn test_rms_of_sine() {
        let buf = AudioBuffer::sine_wave(440.0, 1.0, 1.0, 1, 44100);
        // RMS of unity sine is 1/sqrt(2) = -3.01 dB
        assert!((buf.rms_db() - (-3.01)).abs() < 0.1);
    }

    #[test]
    fn test_normalize_peak_only_when_clipping() {
        let mut quiet = AudioBuffer::from_channels(vec![vec![0.5, -0.25]], 44100).unwrap();
        assert_relative_eq!(quiet.normalize_peak(), 0.5);
        assert_eq!(quiet.channel(0), &[0.5, -0.25]);

        let mut loud = AudioBuffer::from_channels(vec![vec![2.0, -4.0, 1.0]], 44100).unwrap();
        assert_relative_eq!(loud.normalize_peak(), 4.0);
        assert_relative_eq!(loud.peak(), 1.0);
        assert_relative_eq!(loud.channel(0)[0], 0.5);
    }

    #[test]
    fn test_pad_and_trim() {
        let mut buf = AudioBuffer::from_channels(vec![vec![1.0, 2.0, 3.0]], 44100).unwrap();
        buf.pad_end(2);
        assert_eq!(buf.num_samples(), 5);
        buf.trim_start(2);
        assert_eq!(buf.channel(0), &[3.0, 0.0, 0.0]);
    }

    #[test]
    fn test_is_finite() {
        let mut buf = AudioBuffer::new(1, 100, 44100);
        assert!(buf.is_finite());
        buf.channel_mut(0)[50] = f32::NAN;
        assert!(!buf.is_finite());
    }
}
