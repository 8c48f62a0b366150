use thiserror::Error;

use crate::enums::{Confirmation, VolumeAxis};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Maximum X, Y or Z size after scaling is {max}, please check {axis} dimension ({size:.1})")]
    DimensionTooLarge {
        axis: VolumeAxis,
        size: f64,
        max: usize,
    },

    #[error("Scale factor for {axis} must be positive and finite, got {scale}")]
    InvalidScale { axis: VolumeAxis, scale: f64 },

    #[error("{axis} dimension is empty after scaling")]
    EmptyDimension { axis: VolumeAxis },

    #[error("Z resampling needs at least 2 slices, the volume has {depth}")]
    NotEnoughSlices { depth: usize },

    #[error("Slice {slice} does not fit atlas {atlas} at ({x}, {y})")]
    PlacementOutOfBounds {
        slice: usize,
        atlas: usize,
        x: i64,
        y: i64,
    },

    #[error("Lookup table has {actual} channels but the volume has {expected}")]
    LutMismatch { expected: usize, actual: usize },

    #[error("Export declined: {0}")]
    Declined(Confirmation),

    #[error(
        "Unique name '{0}' can't contain spaces or special characters and needs at least 4 characters"
    )]
    InvalidName(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ExportError>;
