//! Host tensor layout
//!
//! The host hands audio around as a dense tensor. Input may be 1D `(samples)`,
//! 2D `(channels, samples)` or `(samples, channels)`, or 3D
//! `(1, channels, samples)`. Output is always `(1, channels, samples)`.

use num_traits::ToPrimitive;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::AudioBuffer;
use crate::error::{PedalboardError, Result};

/// Dense row-major f32 tensor as exchanged with the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waveform {
    shape: Vec<usize>,
    data: Vec<f32>,
}

/// How a waveform maps onto frames and channels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameLayout {
    /// Samples per channel
    pub samples: usize,
    /// Number of channels
    pub channels: usize,
    /// True when rows are channels (planar), false when rows are frames
    pub channel_major: bool,
}

impl Waveform {
    /// Create a waveform, checking that the shape covers the data exactly
    pub fn new(shape: Vec<usize>, data: Vec<f32>) -> Result<Self> {
        let expected: usize = shape.iter().product();
        if expected != data.len() {
            return Err(PedalboardError::TensorConversion {
                reason: format!(
                    "shape {:?} needs {} elements, got {}",
                    shape,
                    expected,
                    data.len()
                ),
            });
        }
        Ok(Self { shape, data })
    }

    /// Create a waveform from any primitive numeric samples
    pub fn from_samples<T: ToPrimitive>(shape: Vec<usize>, samples: &[T]) -> Result<Self> {
        let data = samples
            .iter()
            .enumerate()
            .map(|(i, s)| {
                s.to_f32().ok_or_else(|| PedalboardError::TensorConversion {
                    reason: format!("sample {} is not representable as f32", i),
                })
            })
            .collect::<Result<Vec<f32>>>()?;
        Self::new(shape, data)
    }

    /// Build a waveform from a host value
    ///
    /// Accepts nested numeric arrays of any depth, or an object with
    /// `shape` and `data` fields.
    pub fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Object(_) => {
                let raw: Waveform = serde_json::from_value(value.clone())
                    .map_err(|e| PedalboardError::shape(format!("invalid tensor object: {}", e)))?;
                Self::new(raw.shape, raw.data)
                    .map_err(|e| PedalboardError::shape(e.to_string()))
            }
            Value::Array(_) => {
                let mut shape = Vec::new();
                infer_shape(value, &mut shape);
                let mut data = Vec::with_capacity(shape.iter().product());
                flatten_into(value, &shape, 0, &mut data)?;
                Ok(Self { shape, data })
            }
            Value::Number(n) => {
                let sample = n.as_f64().unwrap_or(0.0) as f32;
                Ok(Self {
                    shape: Vec::new(),
                    data: vec![sample],
                })
            }
            other => Err(PedalboardError::shape(format!(
                "waveform must be a numeric array, got {}",
                json_kind(other)
            ))),
        }
    }

    /// Tensor shape
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Flat row-major data
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Number of dimensions
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Nested-array rendering, the form a host tensor lists to
    pub fn to_nested(&self) -> Value {
        fn nest(shape: &[usize], data: &[f32]) -> Value {
            match shape.split_first() {
                None => data.first().map(|&s| Value::from(s as f64)).unwrap_or(Value::Null),
                Some((&len, rest)) => {
                    let stride: usize = rest.iter().product();
                    Value::Array(
                        (0..len)
                            .map(|i| nest(rest, &data[i * stride..(i + 1) * stride]))
                            .collect(),
                    )
                }
            }
        }
        nest(&self.shape, &self.data)
    }

    /// Work out the (samples, channels) view of this waveform
    ///
    /// 1D becomes one channel, a leading batch axis of 1 is dropped, and a
    /// 2D shape with fewer rows than columns is read as (channels, samples).
    pub fn frame_layout(&self) -> Result<FrameLayout> {
        let (rows, cols) = match self.shape.as_slice() {
            [n] => (*n, 1),
            [r, c] => (*r, *c),
            [batch, r, c] => {
                if *batch != 1 {
                    return Err(PedalboardError::shape(format!(
                        "batch dimension must be 1, got {}",
                        batch
                    )));
                }
                (*r, *c)
            }
            other => {
                return Err(PedalboardError::shape(format!(
                    "expected 1 to 3 dimensions, got {} ({:?})",
                    other.len(),
                    other
                )))
            }
        };

        if rows == 0 || cols == 0 {
            return Err(PedalboardError::shape(format!(
                "audio has no samples (shape {:?})",
                self.shape
            )));
        }

        if rows < cols {
            Ok(FrameLayout {
                samples: cols,
                channels: rows,
                channel_major: true,
            })
        } else {
            Ok(FrameLayout {
                samples: rows,
                channels: cols,
                channel_major: false,
            })
        }
    }

    /// Convert into a planar buffer for processing
    pub fn to_audio_buffer(&self, sample_rate: u32) -> Result<AudioBuffer> {
        let layout = self.frame_layout()?;
        if layout.channel_major {
            let channels = self
                .data
                .chunks_exact(layout.samples)
                .map(<[f32]>::to_vec)
                .collect();
            AudioBuffer::from_channels(channels, sample_rate)
        } else {
            AudioBuffer::from_interleaved(&self.data, layout.channels, sample_rate)
        }
    }

    /// Lay a processed buffer out as `(1, channels, samples)`
    pub fn from_audio_buffer(buffer: &AudioBuffer) -> Result<Self> {
        let channels = buffer.num_channels();
        let samples = buffer.num_samples();
        let data: Vec<f32> = buffer.samples.iter().flatten().copied().collect();
        Self::new(vec![1, channels, samples], data)
    }
}

/// Walk the first element at each depth to find the nominal shape
fn infer_shape(value: &Value, shape: &mut Vec<usize>) {
    if let Value::Array(items) = value {
        shape.push(items.len());
        if let Some(first) = items.first() {
            infer_shape(first, shape);
        }
    }
}

fn flatten_into(value: &Value, shape: &[usize], depth: usize, out: &mut Vec<f32>) -> Result<()> {
    match value {
        Value::Array(items) => {
            if depth >= shape.len() || items.len() != shape[depth] {
                return Err(PedalboardError::shape(format!(
                    "ragged waveform: dimension {} is inconsistent",
                    depth
                )));
            }
            for item in items {
                flatten_into(item, shape, depth + 1, out)?;
            }
            Ok(())
        }
        Value::Number(n) if depth == shape.len() => {
            let sample = n
                .as_f64()
                .ok_or_else(|| PedalboardError::shape("non-finite sample"))?;
            out.push(sample as f32);
            Ok(())
        }
        Value::Number(_) => Err(PedalboardError::shape(format!(
            "ragged waveform: scalar found at depth {}",
            depth
        ))),
        other => Err(PedalboardError::shape(format!(
            "waveform contains {} where a number was expected",
            json_kind(other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
