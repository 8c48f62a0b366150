use crate::error::{ExportError, Result};
use crate::volume::Stack;

use ndarray::{Array3, Array4, ArrayView4, Axis};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Output channels of a converted stack: R, G, B, A.
pub const RGBA_CHANNELS: usize = 4;

/// Linear display mapping from the input range `[left_in, right_in]` onto
/// `[0, 1]`, clamped at both ends.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Scaler {
    pub left_in: f64,
    pub right_in: f64,
}

impl Scaler {
    pub fn new(left_in: f64, right_in: f64) -> Self {
        Self { left_in, right_in }
    }

    #[inline]
    pub fn normalize(&self, value: f64) -> f64 {
        let span = self.right_in - self.left_in;
        if span <= 0.0 {
            return if value > self.left_in { 1.0 } else { 0.0 };
        }
        ((value - self.left_in) / span).clamp(0.0, 1.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LutChannel {
    pub scaler: Scaler,
    /// RGB weight of this channel, each component in `[0, 1]`.
    pub color: [f64; 3],
}

/// The viewer's active lookup table: one scaler and colour per channel.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LookupTable {
    pub channels: Vec<LutChannel>,
}

const DEFAULT_COLORS: [[f64; 3]; 6] = [
    [1.0, 0.0, 0.0],
    [0.0, 1.0, 0.0],
    [0.0, 0.0, 1.0],
    [0.0, 1.0, 1.0],
    [1.0, 0.0, 1.0],
    [1.0, 1.0, 0.0],
];

impl LookupTable {
    /// Grey for a single channel, otherwise red, green, blue, cyan, magenta,
    /// yellow in turn.
    pub fn with_channels(count: usize, right_in: f64) -> Self {
        let channels = (0..count)
            .map(|c| LutChannel {
                scaler: Scaler::new(0.0, right_in),
                color: if count == 1 {
                    [1.0, 1.0, 1.0]
                } else {
                    DEFAULT_COLORS[c % DEFAULT_COLORS.len()]
                },
            })
            .collect();
        Self { channels }
    }

    /// Alpha ramps linearly from zero up to the widest input range of the
    /// red, green and blue channels, so it never saturates before the colour
    /// does. Channels past the third do not widen the ramp.
    pub fn alpha_scaler(&self) -> Scaler {
        let max_right_in = self
            .channels
            .iter()
            .take(3)
            .map(|channel| channel.scaler.right_in)
            .fold(0.0, f64::max);
        Scaler::new(0.0, max_right_in)
    }

    #[inline]
    fn pixel_to_rgba(&self, alpha: &Scaler, samples: &[u16]) -> [u8; RGBA_CHANNELS] {
        let mut rgb = [0.0f64; 3];
        let mut brightest = 0u16;
        for (channel, &sample) in self.channels.iter().zip(samples) {
            let intensity = channel.scaler.normalize(sample as f64);
            for (acc, weight) in rgb.iter_mut().zip(channel.color) {
                *acc += intensity * weight;
            }
            brightest = brightest.max(sample);
        }
        let to_byte = |v: f64| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        [
            to_byte(rgb[0]),
            to_byte(rgb[1]),
            to_byte(rgb[2]),
            to_byte(alpha.normalize(brightest as f64)),
        ]
    }

    /// Converts one time point `(z, y, x, c)` of raw samples into RGBA8.
    pub fn convert(&self, frame: ArrayView4<'_, u16>) -> Result<Stack> {
        let (depth, height, width, channels) = frame.dim();
        if channels != self.channels.len() {
            return Err(ExportError::LutMismatch {
                expected: channels,
                actual: self.channels.len(),
            });
        }
        let alpha = self.alpha_scaler();

        let slices: Vec<Array3<u8>> = frame
            .axis_iter(Axis(0))
            .into_par_iter()
            .map(|slice| {
                let mut out = Array3::<u8>::zeros((height, width, RGBA_CHANNELS));
                let mut samples = vec![0u16; channels];
                for y in 0..height {
                    for x in 0..width {
                        for (c, sample) in samples.iter_mut().enumerate() {
                            *sample = slice[[y, x, c]];
                        }
                        let rgba = self.pixel_to_rgba(&alpha, &samples);
                        for (c, value) in rgba.into_iter().enumerate() {
                            out[[y, x, c]] = value;
                        }
                    }
                }
                out
            })
            .collect();

        let mut data = Array4::<u8>::zeros((depth, height, width, RGBA_CHANNELS));
        for (z, slice) in slices.into_iter().enumerate() {
            data.index_axis_mut(Axis(0), z).assign(&slice);
        }
        Ok(Stack::new(data))
    }
}
