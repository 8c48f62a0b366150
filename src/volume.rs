use crate::color::LookupTable;

use ndarray::{Array4, Array5, ArrayView3, ArrayView4, Axis, s};
use serde::{Deserialize, Serialize};

/// Physical spacing between samples along each axis, in microns.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct VoxelSize {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Default for VoxelSize {
    fn default() -> Self {
        Self {
            x: 1.0,
            y: 1.0,
            z: 1.0,
        }
    }
}

/// A multi-channel 3D+time acquisition as handed over by the data-loading
/// layer. Samples are stored as `(t, z, y, x, c)`.
#[derive(Clone, Debug)]
pub struct Sequence {
    pub data: Array5<u16>,
    pub voxel_size: VoxelSize,
    pub name: String,
    pub lut: LookupTable,
}

impl Sequence {
    /// Wraps raw samples with a default lookup table spanning `max_value`.
    pub fn new(data: Array5<u16>, voxel_size: VoxelSize, name: impl Into<String>) -> Self {
        let channels = data.dim().4;
        let max_value = data.iter().copied().max().unwrap_or(0).max(1);
        let max_value = if max_value > u8::MAX as u16 {
            u16::MAX
        } else {
            u8::MAX as u16
        };
        Self {
            data,
            voxel_size,
            name: name.into(),
            lut: LookupTable::with_channels(channels, max_value as f64),
        }
    }

    pub fn with_lut(mut self, lut: LookupTable) -> Self {
        self.lut = lut;
        self
    }

    /// Get the dimensions of the sequence (time, depth, height, width, channels)
    pub fn dim(&self) -> (usize, usize, usize, usize, usize) {
        self.data.dim()
    }

    pub fn size_t(&self) -> usize {
        self.data.dim().0
    }

    pub fn size_z(&self) -> usize {
        self.data.dim().1
    }

    pub fn size_y(&self) -> usize {
        self.data.dim().2
    }

    pub fn size_x(&self) -> usize {
        self.data.dim().3
    }

    pub fn size_c(&self) -> usize {
        self.data.dim().4
    }

    /// All z-slices of time point `t`, or `None` if it does not exist.
    pub fn frame(&self, t: usize) -> Option<ArrayView4<'_, u16>> {
        if t >= self.size_t() {
            return None;
        }
        Some(self.data.slice(s![t, .., .., .., ..]))
    }

    /// Reinterpret time points as z-slices and vice versa.
    pub fn swap_zt(&mut self) {
        let data = std::mem::take(&mut self.data);
        self.data = data
            .permuted_axes([1, 0, 2, 3, 4])
            .as_standard_layout()
            .into_owned();
    }
}

/// One time point after colour conversion: `(z, y, x, c)` bytes.
#[derive(Clone, Debug, PartialEq)]
pub struct Stack {
    pub data: Array4<u8>,
}

impl Stack {
    pub fn new(data: Array4<u8>) -> Self {
        Self { data }
    }

    pub fn depth(&self) -> usize {
        self.data.dim().0
    }

    pub fn height(&self) -> usize {
        self.data.dim().1
    }

    pub fn width(&self) -> usize {
        self.data.dim().2
    }

    pub fn slice(&self, z: usize) -> ArrayView3<'_, u8> {
        self.data.index_axis(Axis(0), z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counting_sequence(t: usize, z: usize) -> Sequence {
        let data = Array5::from_shape_fn((t, z, 2, 3, 1), |(t, z, y, x, _)| {
            (t * 1000 + z * 100 + y * 10 + x) as u16
        });
        Sequence::new(data, VoxelSize::default(), "counting")
    }

    #[test]
    fn frame_out_of_range_is_none() {
        let sequence = counting_sequence(2, 3);
        assert!(sequence.frame(1).is_some());
        assert!(sequence.frame(2).is_none());
    }

    #[test]
    fn swap_zt_exchanges_axes() {
        let mut sequence = counting_sequence(5, 1);
        sequence.swap_zt();
        assert_eq!(sequence.dim(), (1, 5, 2, 3, 1));
        assert_eq!(sequence.data[[0, 4, 1, 2, 0]], 4012);
    }

    #[test]
    fn default_lut_range_follows_sample_depth() {
        let sequence = counting_sequence(1, 1);
        assert_eq!(sequence.lut.channels[0].scaler.right_in, 255.0);

        let deep = Array5::from_elem((1, 1, 1, 1, 1), 4000u16);
        let sequence = Sequence::new(deep, VoxelSize::default(), "deep");
        assert_eq!(sequence.lut.channels[0].scaler.right_in, 65535.0);
    }
}
