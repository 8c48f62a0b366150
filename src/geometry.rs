use serde::{Deserialize, Serialize};

/// Number of atlas textures the viewer samples from.
pub const NUMBER_OF_ATLASES: usize = 8;

/// Empty depth slots, split between the start and the end of the stack.
pub const Z_PADDING: usize = 4;

/// Smallest power of two that is >= `x`. `0` is treated like `1`.
pub fn next_power_of_two(x: usize) -> usize {
    x.max(1).next_power_of_two()
}

/// Where a single slice lands: which atlas and the pixel origin inside it.
///
/// Coordinates are signed because a degenerate layout can push a slice above
/// the top edge; callers are expected to reject those.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SlicePlacement {
    pub atlas: usize,
    pub x: i64,
    pub y: i64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AtlasLayout {
    pub slice_width: usize,
    pub slice_height: usize,
    pub number_of_images: usize,
    pub number_of_atlases: usize,
    pub z_padding: usize,
    pub padded_slice_width: usize,
    pub padded_slice_height: usize,
    pub slices_per_atlas: usize,
    pub atlas_width: usize,
    pub atlas_height: usize,
    pub x_offset: usize,
    pub y_offset: usize,
}

impl AtlasLayout {
    /// Layout with the viewer's fixed atlas count and padding.
    pub fn new(slice_width: usize, slice_height: usize, number_of_images: usize) -> Self {
        Self::compute(
            slice_width,
            slice_height,
            number_of_images,
            NUMBER_OF_ATLASES,
            Z_PADDING,
        )
    }

    pub fn compute(
        slice_width: usize,
        slice_height: usize,
        number_of_images: usize,
        number_of_atlases: usize,
        z_padding: usize,
    ) -> Self {
        let number_of_atlases = number_of_atlases.max(1);
        let padded_slice_depth = number_of_images + z_padding;

        let padded_slice_width = next_power_of_two(slice_width);
        let padded_slice_height = next_power_of_two(slice_height);

        let x_offset = (padded_slice_width - slice_width.min(padded_slice_width)) / 2;
        let y_offset = (padded_slice_height - slice_height.min(padded_slice_height)) / 2;

        let slices_per_atlas = padded_slice_depth.div_ceil(number_of_atlases);
        let mut atlas_width = next_power_of_two(padded_slice_width);
        let mut atlas_height = next_power_of_two(padded_slice_height * slices_per_atlas);

        // Trade height for width until the atlas is at most twice as tall as wide
        while atlas_height > 2 * atlas_width && atlas_height > slice_height {
            atlas_height /= 2;
            atlas_width *= 2;
        }

        Self {
            slice_width,
            slice_height,
            number_of_images,
            number_of_atlases,
            z_padding,
            padded_slice_width,
            padded_slice_height,
            slices_per_atlas,
            atlas_width,
            atlas_height,
            x_offset,
            y_offset,
        }
    }

    pub fn slices_per_row(&self) -> usize {
        self.atlas_width / self.padded_slice_width
    }

    /// Atlas and pixel origin of source slice `index`.
    ///
    /// Slices are dealt round-robin across atlases (`j mod N`), filling each
    /// atlas row-major from the bottom up since the viewer's texture Y axis
    /// points the other way.
    pub fn placement(&self, index: usize) -> SlicePlacement {
        let j = index + self.z_padding / 2;
        let atlas = j % self.number_of_atlases;
        let location_index = j / self.number_of_atlases;
        let slices_per_row = self.slices_per_row().max(1);

        let x = (location_index % slices_per_row) * self.padded_slice_width + self.x_offset;
        let row_start = (location_index / slices_per_row) * self.padded_slice_height;
        let y = self.atlas_height as i64 - row_start as i64 - self.padded_slice_height as i64
            + self.y_offset as i64;

        SlicePlacement {
            atlas,
            x: x as i64,
            y,
        }
    }

    /// Whether a slice at `placement` lies fully inside its atlas.
    pub fn contains(&self, placement: &SlicePlacement) -> bool {
        self.slices_per_row() > 0
            && placement.x >= 0
            && placement.y >= 0
            && placement.x as usize + self.slice_width <= self.atlas_width
            && placement.y as usize + self.slice_height <= self.atlas_height
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn next_power_of_two_small_values() {
        assert_eq!(next_power_of_two(1), 1);
        assert_eq!(next_power_of_two(2), 2);
        assert_eq!(next_power_of_two(3), 4);
        assert_eq!(next_power_of_two(260), 512);
        assert_eq!(next_power_of_two(512), 512);
        assert_eq!(next_power_of_two(513), 1024);
    }

    #[test]
    fn matches_log2_ceil_formula() {
        for x in 1..=10_000usize {
            let expected = 2f64.powf((x as f64).log2().ceil()) as usize;
            assert_eq!(next_power_of_two(x), expected, "x = {x}");
        }
    }

    #[test]
    fn half_scaled_520_volume_pads_to_512() {
        let layout = AtlasLayout::new(260, 260, 512);
        assert_eq!(layout.padded_slice_width, 512);
        assert_eq!(layout.padded_slice_height, 512);
        assert_eq!(layout.x_offset, 126);
        assert_eq!(layout.y_offset, 126);
        assert_eq!(layout.slices_per_atlas, 65);
    }

    #[test]
    fn tall_atlas_is_rebalanced() {
        // 100 slices of 64x64: 13 per atlas, 64 * 13 = 832 -> 1024 tall, 64 wide
        let layout = AtlasLayout::new(64, 64, 100);
        assert_eq!(layout.slices_per_atlas, 13);
        assert_eq!(layout.atlas_width, 256);
        assert_eq!(layout.atlas_height, 256);
        assert_eq!(layout.slices_per_row(), 4);
    }

    #[test]
    fn first_slice_lands_in_atlas_two() {
        let layout = AtlasLayout::new(10, 6, 4);
        // 16x8 cells, 1 slice per atlas
        assert_eq!(layout.padded_slice_width, 16);
        assert_eq!(layout.padded_slice_height, 8);
        assert_eq!(layout.atlas_width, 16);
        assert_eq!(layout.atlas_height, 8);

        let first = layout.placement(0);
        assert_eq!(first, SlicePlacement { atlas: 2, x: 3, y: 1 });
        let last = layout.placement(3);
        assert_eq!(last.atlas, 5);
    }

    #[test]
    fn tall_thin_slices_can_fall_outside_the_atlas() {
        // 16 wide, 100 tall, single slice: the rebalance leaves a 32x64 atlas
        // which cannot hold a 128 tall cell
        let layout = AtlasLayout::new(16, 100, 1);
        assert_eq!(layout.atlas_height, 64);
        assert!(layout.atlas_height < layout.padded_slice_height);
        assert!(!layout.contains(&layout.placement(0)));
    }

    fn is_power_of_two(x: usize) -> bool {
        x != 0 && x & (x - 1) == 0
    }

    proptest! {
        #[test]
        fn next_power_of_two_bounds(x in 1usize..=10_000) {
            let p = next_power_of_two(x);
            prop_assert!(is_power_of_two(p));
            prop_assert!(p >= x);
            if x > 1 {
                prop_assert!(p / 2 < x);
            }
        }

        #[test]
        fn layout_capacity(
            width in 1usize..=500,
            height in 1usize..=500,
            images in 1usize..=500,
        ) {
            let layout = AtlasLayout::new(width, height, images);
            prop_assert!(is_power_of_two(layout.atlas_width));
            prop_assert!(is_power_of_two(layout.atlas_height));
            let needed = layout.padded_slice_width
                * layout.padded_slice_height
                * (images + Z_PADDING).div_ceil(NUMBER_OF_ATLASES);
            prop_assert!(layout.atlas_width * layout.atlas_height >= needed);
        }

        #[test]
        fn layout_is_deterministic(
            width in 1usize..=500,
            height in 1usize..=500,
            images in 1usize..=500,
        ) {
            prop_assert_eq!(
                AtlasLayout::new(width, height, images),
                AtlasLayout::new(width, height, images)
            );
        }
    }
}
