use crate::geometry::AtlasLayout;
use crate::volume::VoxelSize;

use serde::{Deserialize, Serialize};

pub const NUMBERING_FORMAT: &str = "0000";

/// Layout record handed to the viewer alongside the atlas images.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AtlasManifest {
    pub name: String,
    pub image_prefix: String,
    pub numbering_format: String,
    pub slice_width: usize,
    pub slice_height: usize,
    pub number_of_images: usize,
    pub number_of_atlases: usize,
    pub slices_per_atlas: usize,
    pub atlas_width: usize,
    pub atlas_height: usize,
    /// Spacing of the exported samples, i.e. the source voxel size divided by
    /// the scale applied on each axis.
    pub voxel_size: VoxelSize,
}

impl AtlasManifest {
    pub fn new(name: &str, layout: &AtlasLayout, voxel_size: VoxelSize) -> Self {
        Self {
            name: name.to_string(),
            image_prefix: format!("{name}_z"),
            numbering_format: NUMBERING_FORMAT.to_string(),
            slice_width: layout.slice_width,
            slice_height: layout.slice_height,
            number_of_images: layout.number_of_images,
            number_of_atlases: layout.number_of_atlases,
            slices_per_atlas: layout.slices_per_atlas,
            atlas_width: layout.atlas_width,
            atlas_height: layout.atlas_height,
            voxel_size,
        }
    }

    /// File name of atlas `index`, e.g. `cells_z0003.png`.
    pub fn atlas_file_name(&self, index: usize) -> String {
        format!("{}{:04}.png", self.image_prefix, index)
    }

    /// Placeholder/value pairs for the viewer page template.
    pub fn substitutions(&self) -> Vec<(&'static str, String)> {
        vec![
            ("templateTitle", format!("{} - FPBioimage Viewer", self.name)),
            ("templateImagePath", ".".to_string()),
            ("templateUniqueName", self.name.clone()),
            ("templateNumberOfImages", self.number_of_images.to_string()),
            ("templateImagePrefix", self.image_prefix.clone()),
            ("templateNumberingFormat", self.numbering_format.clone()),
            ("templateVoxelX", format!("{:?}", self.voxel_size.x)),
            ("templateVoxelY", format!("{:?}", self.voxel_size.y)),
            ("templateVoxelZ", format!("{:?}", self.voxel_size.z)),
            ("templateSliceWidth", self.slice_width.to_string()),
            ("templateSliceHeight", self.slice_height.to_string()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest() -> AtlasManifest {
        let layout = AtlasLayout::new(260, 200, 120);
        AtlasManifest::new(
            "mitosis",
            &layout,
            VoxelSize {
                x: 0.2,
                y: 0.2,
                z: 1.5,
            },
        )
    }

    #[test]
    fn atlas_files_are_zero_padded() {
        let manifest = manifest();
        assert_eq!(manifest.atlas_file_name(0), "mitosis_z0000.png");
        assert_eq!(manifest.atlas_file_name(7), "mitosis_z0007.png");
    }

    #[test]
    fn substitutions_cover_layout_fields() {
        let manifest = manifest();
        let values = manifest.substitutions();
        let lookup = |key: &str| {
            values
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.as_str())
        };
        assert_eq!(lookup("templateSliceWidth"), Some("260"));
        assert_eq!(lookup("templateSliceHeight"), Some("200"));
        assert_eq!(lookup("templateNumberOfImages"), Some("120"));
        assert_eq!(lookup("templateImagePrefix"), Some("mitosis_z"));
        assert_eq!(lookup("templateVoxelZ"), Some("1.5"));
    }

    #[test]
    fn whole_voxel_sizes_keep_their_decimal_point() {
        let manifest = AtlasManifest::new("unit", &AtlasLayout::new(8, 8, 2), VoxelSize::default());
        let values = manifest.substitutions();
        for key in ["templateVoxelX", "templateVoxelY", "templateVoxelZ"] {
            let value = values.iter().find(|(k, _)| *k == key).map(|(_, v)| v.as_str());
            assert_eq!(value, Some("1.0"), "{key}");
        }
    }

    #[test]
    fn serializes_to_json() {
        let manifest = manifest();
        let json = serde_json::to_string(&manifest).unwrap();
        let back: AtlasManifest = serde_json::from_str(&json).unwrap();
        assert_eq!(back, manifest);
        assert!(json.contains("\"slices_per_atlas\":16"));
    }
}
