use crate::error::{ExportError, Result};
use crate::volume::Stack;

use ndarray::{Array3, Array4, ArrayView3, Axis};
use rayon::prelude::*;

pub(crate) struct Interpolator;

impl Interpolator {
    #[inline]
    pub(crate) fn bilinear_interpolate(slice: &ArrayView3<u8>, y: f32, x: f32, c: usize) -> f32 {
        let (height, width, _) = slice.dim();

        let y0 = y.floor() as usize;
        let x0 = x.floor() as usize;
        let y1 = (y0 + 1).min(height - 1);
        let x1 = (x0 + 1).min(width - 1);

        let dy = y - y0 as f32;
        let dx = x - x0 as f32;
        let one_minus_dx = 1.0 - dx;
        let one_minus_dy = 1.0 - dy;

        let v00 = slice[[y0, x0, c]] as f32;
        let v01 = slice[[y0, x1, c]] as f32;
        let v10 = slice[[y1, x0, c]] as f32;
        let v11 = slice[[y1, x1, c]] as f32;

        let v0 = v00.mul_add(one_minus_dx, v01 * dx);
        let v1 = v10.mul_add(one_minus_dx, v11 * dx);

        v0.mul_add(one_minus_dy, v1 * dy)
    }

    /// Maps an output pixel centre back onto the source grid.
    #[inline]
    fn source_coordinate(dst: usize, dst_len: usize, src_len: usize) -> f32 {
        let normalized = (dst as f32 + 0.5) / dst_len as f32;
        (normalized * src_len as f32 - 0.5).clamp(0.0, (src_len - 1) as f32)
    }

    fn resample_slice(slice: &ArrayView3<u8>, width: usize, height: usize) -> Array3<u8> {
        let (slice_height, slice_width, channels) = slice.dim();
        Array3::from_shape_fn((height, width, channels), |(y, x, c)| {
            let src_x = Self::source_coordinate(x, width, slice_width);
            let src_y = Self::source_coordinate(y, height, slice_height);
            Self::bilinear_interpolate(slice, src_y, src_x, c)
                .round()
                .clamp(0.0, 255.0) as u8
        })
    }

    /// Resamples every slice of `stack` to `width` x `height`.
    pub(crate) fn resample_xy(stack: Stack, width: usize, height: usize) -> Stack {
        if stack.width() == width && stack.height() == height {
            return stack;
        }
        let (depth, _, _, channels) = stack.data.dim();

        let slices: Vec<Array3<u8>> = stack
            .data
            .axis_iter(Axis(0))
            .into_par_iter()
            .map(|slice| Self::resample_slice(&slice, width, height))
            .collect();

        let mut data = Array4::<u8>::zeros((depth, height, width, channels));
        for (z, slice) in slices.into_iter().enumerate() {
            data.index_axis_mut(Axis(0), z).assign(&slice);
        }
        Stack::new(data)
    }

    /// Index of the lower of the two source slices blended into output slice
    /// `n`, pulled back so that `index + 1` is always a valid slice.
    #[inline]
    pub(crate) fn lower_source_slice(n: usize, scale: f64, old_depth: usize) -> usize {
        let old_z_slice = (n as f64 / scale).floor() as usize;
        if old_z_slice + 1 >= old_depth {
            old_depth - 2
        } else {
            old_z_slice
        }
    }

    /// Shrinks `stack` along z by `scale` (< 1) with linear interpolation
    /// between neighbouring slices.
    ///
    /// Both blend weights come from the ideal (unrounded) new depth, so every
    /// output slice mixes its neighbours `scale : 1 - scale` regardless of
    /// where it falls between them.
    pub(crate) fn resample_z(stack: &Stack, scale: f64) -> Result<Stack> {
        let (old_depth, height, width, channels) = stack.data.dim();
        if old_depth < 2 {
            return Err(ExportError::NotEnoughSlices { depth: old_depth });
        }

        let ideal_new_depth = old_depth as f64 * scale;
        let mix_a = ideal_new_depth / old_depth as f64;
        let mix_b = 1.0 - mix_a;
        let new_depth = ideal_new_depth.ceil() as usize;

        let slices: Vec<Array3<u8>> = (0..new_depth)
            .into_par_iter()
            .map(|n| {
                let lower = Self::lower_source_slice(n, scale, old_depth);
                let below = stack.slice(lower);
                let above = stack.slice(lower + 1);
                let mut out = Array3::<u8>::zeros((height, width, channels));
                for x in 0..width {
                    for y in 0..height {
                        for c in 0..channels {
                            let value = mix_a * above[[y, x, c]] as f64
                                + mix_b * below[[y, x, c]] as f64;
                            out[[y, x, c]] = value.round() as u8;
                        }
                    }
                }
                out
            })
            .collect();

        let mut data = Array4::<u8>::zeros((new_depth, height, width, channels));
        for (z, slice) in slices.into_iter().enumerate() {
            data.index_axis_mut(Axis(0), z).assign(&slice);
        }
        Ok(Stack::new(data))
    }
}
