//! WAV file I/O
//!
//! Used by the command-line front end to feed files through the node.
//! Samples keep their native sample rate; the node never resamples.

use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};

use super::AudioBuffer;
use crate::error::{PedalboardError, Result};

/// Import a WAV file as a planar f32 buffer
///
/// # Errors
/// * `AudioRead` - If the file cannot be opened or decoded
/// * `InvalidShape` - If the file holds no samples
pub fn import_wav(path: &Path) -> Result<AudioBuffer> {
    let reader = WavReader::open(path).map_err(|source| PedalboardError::AudioRead {
        path: path.to_path_buf(),
        source,
    })?;

    let spec = reader.spec();
    let channels = spec.channels as usize;
    let interleaved = read_samples_as_f32(reader, spec.bits_per_sample, spec.sample_format)
        .map_err(|source| PedalboardError::AudioRead {
            path: path.to_path_buf(),
            source,
        })?;

    let buffer = AudioBuffer::from_interleaved(&interleaved, channels, spec.sample_rate)?;
    if buffer.is_empty() {
        return Err(PedalboardError::shape(format!(
            "{} contains no samples",
            path.display()
        )));
    }
    Ok(buffer)
}

/// Export a buffer to a WAV file
///
/// `bit_depth` is 16 or 24 for integer PCM, 32 for float.
pub fn export_wav(buffer: &AudioBuffer, path: &Path, bit_depth: u16) -> Result<()> {
    let sample_format = match bit_depth {
        16 | 24 => SampleFormat::Int,
        32 => SampleFormat::Float,
        other => {
            return Err(PedalboardError::Config {
                reason: format!("{}-bit audio (only 16, 24, 32 supported)", other),
            })
        }
    };

    let spec = WavSpec {
        channels: buffer.num_channels() as u16,
        sample_rate: buffer.sample_rate,
        bits_per_sample: bit_depth,
        sample_format,
    };

    let write_err = |source: hound::Error| PedalboardError::AudioWrite {
        path: path.to_path_buf(),
        source,
    };

    let mut writer = WavWriter::create(path, spec).map_err(write_err)?;
    for sample in buffer.to_interleaved() {
        match bit_depth {
            16 => {
                let scaled = (sample * 32767.0).clamp(-32768.0, 32767.0) as i16;
                writer.write_sample(scaled).map_err(write_err)?;
            }
            24 => {
                // 24-bit stored as i32 in hound
                let scaled = (sample * 8388607.0).clamp(-8388608.0, 8388607.0) as i32;
                writer.write_sample(scaled).map_err(write_err)?;
            }
            _ => writer.write_sample(sample).map_err(write_err)?,
        }
    }
    writer.finalize().map_err(write_err)?;

    Ok(())
}

fn read_samples_as_f32<R: std::io::Read>(
    mut reader: WavReader<R>,
    bits_per_sample: u16,
    sample_format: SampleFormat,
) -> std::result::Result<Vec<f32>, hound::Error> {
    match sample_format {
        SampleFormat::Float => reader.samples::<f32>().collect(),
        SampleFormat::Int => {
            let scale = (1_i64 << (bits_per_sample.saturating_sub(1))) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use tempfile::tempdir;

    #[test]
    fn test_wav_round_trip_float() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        let buffer = AudioBuffer::sine_wave(440.0, 0.5, 0.1, 2, 44100);

        export_wav(&buffer, &path, 32).unwrap();
        let loaded = import_wav(&path).unwrap();

        assert_eq!(loaded.num_channels(), 2);
        assert_eq!(loaded.num_samples(), buffer.num_samples());
        assert_eq!(loaded.sample_rate, 44100);
        assert_abs_diff_eq!(loaded.channel(1)[100], buffer.channel(1)[100], epsilon = 1e-6);
    }

    #[test]
    fn test_wav_16_bit_quantization() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tone16.wav");
        let buffer = AudioBuffer::sine_wave(1000.0, 0.8, 0.05, 1, 48000);

        export_wav(&buffer, &path, 16).unwrap();
        let loaded = import_wav(&path).unwrap();

        assert_abs_diff_eq!(loaded.channel(0)[17], buffer.channel(0)[17], epsilon = 1e-3);
    }

    #[test]
    fn test_rejects_unsupported_bit_depth() {
        let dir = tempdir().unwrap();
        let buffer = AudioBuffer::new(1, 10, 44100);
        let err = export_wav(&buffer, &dir.path().join("x.wav"), 12).unwrap_err();
        assert_eq!(err.error_code(), "CONFIG_ERROR");
    }

    #[test]
    fn test_missing_file() {
        let err = import_wav(Path::new("/definitely/not/here.wav")).unwrap_err();
        assert_eq!(err.error_code(), "AUDIO_READ");
    }
}
