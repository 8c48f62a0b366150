use crate::color::RGBA_CHANNELS;
use crate::error::{ExportError, Result};
use crate::geometry::{AtlasLayout, SlicePlacement};
use crate::volume::Stack;

use image::RgbaImage;
use ndarray::ArrayView3;

/// The atlas textures of one export, all `atlas_width x atlas_height` RGBA8
/// and fully transparent until slices are packed into them.
#[derive(Clone, Debug, PartialEq)]
pub struct AtlasSet {
    pub layout: AtlasLayout,
    pub images: Vec<RgbaImage>,
}

impl AtlasSet {
    pub fn new(layout: AtlasLayout) -> Self {
        let images = (0..layout.number_of_atlases)
            .map(|_| RgbaImage::new(layout.atlas_width as u32, layout.atlas_height as u32))
            .collect();
        Self { layout, images }
    }

    /// Packs every slice of `stack` into a fresh atlas set.
    ///
    /// All placements are checked before anything is allocated; a slice that
    /// would leave its atlas means the layout is unusable for this shape.
    pub fn pack(stack: &Stack, layout: AtlasLayout) -> Result<Self> {
        let placements = (0..stack.depth())
            .map(|index| {
                let placement = layout.placement(index);
                if layout.contains(&placement) {
                    Ok(placement)
                } else {
                    Err(ExportError::PlacementOutOfBounds {
                        slice: index,
                        atlas: placement.atlas,
                        x: placement.x,
                        y: placement.y,
                    })
                }
            })
            .collect::<Result<Vec<_>>>()?;

        let mut atlases = Self::new(layout);
        for (index, placement) in placements.iter().enumerate() {
            atlases.copy_slice(&stack.slice(index), placement);
        }
        Ok(atlases)
    }

    /// Straight row-by-row overwrite of the slice into its atlas.
    fn copy_slice(&mut self, slice: &ArrayView3<'_, u8>, placement: &SlicePlacement) {
        let (height, width, _) = slice.dim();
        let atlas_width = self.layout.atlas_width;
        let row_bytes = width * RGBA_CHANNELS;
        let (x, y) = (placement.x as usize, placement.y as usize);
        let destination: &mut [u8] = &mut self.images[placement.atlas];

        for (row, source) in slice.outer_iter().enumerate() {
            let offset = ((y + row) * atlas_width + x) * RGBA_CHANNELS;
            let target = &mut destination[offset..offset + row_bytes];
            match source.as_slice() {
                Some(bytes) => target.copy_from_slice(bytes),
                None => target
                    .iter_mut()
                    .zip(source.iter())
                    .for_each(|(dst, src)| *dst = *src),
            }
        }
        debug_assert!(y + height <= self.layout.atlas_height);
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{NUMBER_OF_ATLASES, Z_PADDING};
    use ndarray::Array4;
    use proptest::prelude::*;

    fn numbered_stack(depth: usize, height: usize, width: usize) -> Stack {
        Stack::new(Array4::from_shape_fn(
            (depth, height, width, RGBA_CHANNELS),
            |(z, y, x, c)| if c == 3 { 255 } else { (z + 1 + y + x) as u8 },
        ))
    }

    #[test]
    fn atlases_start_transparent() {
        let atlases = AtlasSet::new(AtlasLayout::new(5, 5, 3));
        assert_eq!(atlases.len(), NUMBER_OF_ATLASES);
        assert!(atlases.images.iter().all(|img| img.as_raw().iter().all(|&b| b == 0)));
    }

    #[test]
    fn slices_are_copied_to_their_placement() {
        let stack = numbered_stack(4, 6, 10);
        let layout = AtlasLayout::new(10, 6, 4);
        let atlases = AtlasSet::pack(&stack, layout).unwrap();

        // slice 0 goes to atlas 2 at (3, 1)
        let image = &atlases.images[2];
        assert_eq!(image.get_pixel(3, 1).0, [1, 1, 1, 255]);
        assert_eq!(image.get_pixel(12, 6).0, [15, 15, 15, 255]);
        // padding around it stays transparent
        assert_eq!(image.get_pixel(2, 1).0, [0, 0, 0, 0]);
        assert_eq!(image.get_pixel(3, 0).0, [0, 0, 0, 0]);
        assert_eq!(image.get_pixel(13, 7).0, [0, 0, 0, 0]);

        // the padding atlases 0, 1, 6 and 7 hold nothing
        for empty in [0, 1, 6, 7] {
            assert!(atlases.images[empty].as_raw().iter().all(|&b| b == 0));
        }
    }

    #[test]
    fn rows_fill_from_the_bottom() {
        // 4x4 slices, 20 images -> 3 per atlas in a 8x8 atlas with 2 per row
        let layout = AtlasLayout::new(4, 4, 20);
        assert_eq!((layout.atlas_width, layout.atlas_height), (8, 8));
        assert_eq!(layout.placement(6), SlicePlacement { atlas: 0, x: 4, y: 4 });
        assert_eq!(layout.placement(14), SlicePlacement { atlas: 0, x: 0, y: 0 });
        assert_eq!(layout.placement(19), SlicePlacement { atlas: 5, x: 0, y: 0 });
    }

    #[test]
    fn unusable_layout_is_rejected() {
        let stack = numbered_stack(1, 100, 16);
        let layout = AtlasLayout::new(16, 100, 1);
        assert!(matches!(
            AtlasSet::pack(&stack, layout),
            Err(ExportError::PlacementOutOfBounds { slice: 0, .. })
        ));
    }

    #[test]
    fn packing_twice_is_identical() {
        let stack = numbered_stack(13, 7, 9);
        let layout = AtlasLayout::new(9, 7, 13);
        let first = AtlasSet::pack(&stack, layout).unwrap();
        let second = AtlasSet::pack(&stack, layout).unwrap();
        assert_eq!(first, second);
    }

    proptest! {
        #[test]
        fn placements_fit_exactly_when_a_cell_fits(
            width in 1usize..=300,
            height in 1usize..=500,
            images in 1usize..=300,
        ) {
            let layout = AtlasLayout::new(width, height, images);
            let placements: Vec<_> = (0..images).map(|i| layout.placement(i)).collect();
            let usable = layout.atlas_height >= layout.padded_slice_height;

            if !usable {
                prop_assert!(placements.iter().any(|p| !layout.contains(p)));
                return Ok(());
            }

            for (i, a) in placements.iter().enumerate() {
                prop_assert!(layout.contains(a), "slice {} outside atlas", i);
                for b in &placements[i + 1..] {
                    if a.atlas != b.atlas {
                        continue;
                    }
                    let apart_x = a.x + width as i64 <= b.x || b.x + width as i64 <= a.x;
                    let apart_y = a.y + height as i64 <= b.y || b.y + height as i64 <= a.y;
                    prop_assert!(apart_x || apart_y);
                }
            }
            prop_assert!(images + Z_PADDING <= layout.slices_per_atlas * NUMBER_OF_ATLASES);
        }
    }
}
