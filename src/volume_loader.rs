use crate::{
    enums::SortBy,
    volume::{Sequence, VoxelSize},
};

use image::{DynamicImage, ImageReader};
use ndarray::{Array2, Array3, Array5, s};
use std::{
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VolumeLoaderError {
    #[error("No valid images found")]
    NoValidImages,

    #[error("Inconsistent image dimensions")]
    InconsistentDimensions,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

const EXTENSIONS: [&str; 3] = ["png", "tif", "tiff"];

pub struct VolumeLoader;

impl VolumeLoader {
    /// Build a single time point sequence from already decoded z-slices
    ///
    /// # Errors
    ///
    /// Returns error if no images are given or their dimensions differ
    pub fn load_from_images(
        images: &[DynamicImage],
        voxel_size: VoxelSize,
        name: &str,
    ) -> Result<Sequence, VolumeLoaderError> {
        if images.is_empty() {
            return Err(VolumeLoaderError::NoValidImages);
        }
        let slices: Vec<Array3<u16>> = images.iter().map(Self::decode_image).collect();
        Self::validate_dimensions(&slices)?;

        let (height, width, channels) = slices[0].dim();
        let mut data = Array5::<u16>::zeros((1, slices.len(), height, width, channels));
        for (z, slice) in slices.iter().enumerate() {
            data.slice_mut(s![0, z, .., .., ..]).assign(slice);
        }

        Ok(Sequence::new(data, voxel_size, name))
    }

    /// Load a z-stack from image file paths, one slice per file
    pub fn load_from_file_paths(
        paths: &[impl AsRef<Path>],
        voxel_size: VoxelSize,
        name: &str,
    ) -> Result<Sequence, VolumeLoaderError> {
        let images: Result<Vec<_>, VolumeLoaderError> = paths
            .iter()
            .map(|path| -> Result<DynamicImage, VolumeLoaderError> {
                Ok(ImageReader::open(path.as_ref())?.decode()?)
            })
            .collect();

        Self::load_from_images(&images?, voxel_size, name)
    }

    /// Load a z-stack from a directory of png/tif files, named after the
    /// directory
    pub fn load_from_directory(
        path: impl AsRef<Path>,
        sort_by: SortBy,
        voxel_size: VoxelSize,
    ) -> Result<Sequence, VolumeLoaderError> {
        let mut paths: Vec<PathBuf> = fs::read_dir(path.as_ref())?
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| {
                path.extension()
                    .and_then(|s| s.to_str())
                    .is_some_and(|ext| EXTENSIONS.iter().any(|e| ext.eq_ignore_ascii_case(e)))
            })
            .collect();

        if paths.is_empty() {
            return Err(VolumeLoaderError::NoValidImages);
        }

        match sort_by {
            SortBy::FileName => alphanumeric_sort::sort_path_slice(&mut paths),
            SortBy::None => {}
        }

        let name = path
            .as_ref()
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string();
        Self::load_from_file_paths(&paths, voxel_size, &name)
    }

    /// Grey images keep one channel, everything else is read as RGB.
    fn decode_image(image: &DynamicImage) -> Array3<u16> {
        let (width, height) = (image.width() as usize, image.height() as usize);
        let is_deep = matches!(
            image,
            DynamicImage::ImageLuma16(_)
                | DynamicImage::ImageLumaA16(_)
                | DynamicImage::ImageRgb16(_)
                | DynamicImage::ImageRgba16(_)
        );
        let widen = |v: u16| if is_deep { v } else { v >> 8 };

        if image.color().has_color() {
            let rgb = image.to_rgb16();
            Array3::from_shape_fn((height, width, 3), |(y, x, c)| {
                widen(rgb.get_pixel(x as u32, y as u32)[c])
            })
        } else {
            let luma = image.to_luma16();
            let plane = Array2::from_shape_fn((height, width), |(y, x)| {
                widen(luma.get_pixel(x as u32, y as u32)[0])
            });
            plane.insert_axis(ndarray::Axis(2))
        }
    }

    fn validate_dimensions(slices: &[Array3<u16>]) -> Result<(), VolumeLoaderError> {
        let first_dim = slices[0].dim();
        if slices.iter().any(|slice| slice.dim() != first_dim) {
            return Err(VolumeLoaderError::InconsistentDimensions);
        }
        Ok(())
    }
}
