use crate::atlas::AtlasSet;
use crate::enums::{Confirmation, VolumeAxis};
use crate::error::{ExportError, Result};
use crate::geometry::AtlasLayout;
use crate::interpolator::Interpolator;
use crate::manifest::AtlasManifest;
use crate::volume::{Sequence, VoxelSize};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use web_time::Instant;

/// Largest size, in samples, the viewer accepts along any axis.
pub const MAX_OUTPUT_DIMENSION: usize = 500;

/// Z scales at or above this are treated as "leave z alone".
pub const Z_SCALE_THRESHOLD: f64 = 0.999;

/// Size that oversized axes are scaled down to by [`defaults`].
pub const DEFAULT_TARGET_DIMENSION: f64 = 400.0;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScaleFactors {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Default for ScaleFactors {
    fn default() -> Self {
        Self {
            x: 1.0,
            y: 1.0,
            z: 1.0,
        }
    }
}

impl ScaleFactors {
    pub fn resamples_z(&self) -> bool {
        self.z < Z_SCALE_THRESHOLD
    }
}

/// Values an export form should start from for a given sequence.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExportDefaults {
    pub scale: ScaleFactors,
    pub voxel_size: VoxelSize,
    pub name: String,
}

/// Suggests scales that bring every axis of `sequence` under the size cap,
/// along with its voxel size and name.
pub fn defaults(sequence: &Sequence) -> ExportDefaults {
    let (size_x, size_y, size_z) = (
        sequence.size_x() as f64,
        sequence.size_y() as f64,
        sequence.size_z() as f64,
    );
    let limit = MAX_OUTPUT_DIMENSION as f64;

    let mut scale = ScaleFactors::default();
    if size_x > limit || size_y > limit {
        let xy = (DEFAULT_TARGET_DIMENSION / size_x).min(DEFAULT_TARGET_DIMENSION / size_y);
        scale.x = xy;
        scale.y = xy;
    }
    if size_z > limit {
        scale.z = DEFAULT_TARGET_DIMENSION / size_z;
    }

    ExportDefaults {
        scale,
        voxel_size: sequence.voxel_size,
        name: sequence.name.clone(),
    }
}

/// Everything one export run needs besides the sequence itself.
/// Fields missing from a deserialized config take their default values.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub time_index: usize,
    pub scale: ScaleFactors,
    /// Voxel size of the sequence before scaling.
    pub voxel_size: VoxelSize,
    pub name: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            time_index: 0,
            scale: ScaleFactors::default(),
            voxel_size: VoxelSize::default(),
            name: String::new(),
        }
    }
}

impl From<ExportDefaults> for ExportConfig {
    fn from(defaults: ExportDefaults) -> Self {
        Self {
            time_index: 0,
            scale: defaults.scale,
            voxel_size: defaults.voxel_size,
            name: defaults.name,
        }
    }
}

impl ExportConfig {
    pub fn for_sequence(sequence: &Sequence) -> Self {
        defaults(sequence).into()
    }

    /// Spacing of the exported samples.
    pub fn scaled_voxel_size(&self) -> VoxelSize {
        VoxelSize {
            x: self.voxel_size.x / self.scale.x,
            y: self.voxel_size.y / self.scale.y,
            z: self.voxel_size.z / self.scale.z,
        }
    }
}

/// Answers the pipeline's yes/no questions. Closures and plain booleans work
/// as answerers too.
pub trait Confirm {
    fn confirm(&self, request: Confirmation) -> bool;
}

impl Confirm for bool {
    fn confirm(&self, _request: Confirmation) -> bool {
        *self
    }
}

impl<F> Confirm for F
where
    F: Fn(Confirmation) -> bool,
{
    fn confirm(&self, request: Confirmation) -> bool {
        self(request)
    }
}

/// Result of one run: the packed atlases and the record describing them.
#[derive(Clone, Debug, PartialEq)]
pub struct AtlasExport {
    pub atlases: AtlasSet,
    pub manifest: AtlasManifest,
}

/// Checks `size * scale` against the cap on every axis and returns the
/// scaled in-plane size `(width, height)`.
pub fn output_dimensions(
    size: (usize, usize, usize),
    scale: &ScaleFactors,
) -> Result<(usize, usize)> {
    let axes = [
        (VolumeAxis::X, size.0, scale.x),
        (VolumeAxis::Y, size.1, scale.y),
        (VolumeAxis::Z, size.2, scale.z),
    ];
    for (axis, size, scale) in axes {
        if !scale.is_finite() || scale <= 0.0 {
            return Err(ExportError::InvalidScale { axis, scale });
        }
        let scaled = size as f64 * scale;
        if scaled > MAX_OUTPUT_DIMENSION as f64 {
            return Err(ExportError::DimensionTooLarge {
                axis,
                size: scaled,
                max: MAX_OUTPUT_DIMENSION,
            });
        }
    }

    let width = (size.0 as f64 * scale.x).round() as usize;
    let height = (size.1 as f64 * scale.y).round() as usize;
    if width == 0 {
        return Err(ExportError::EmptyDimension { axis: VolumeAxis::X });
    }
    if height == 0 {
        return Err(ExportError::EmptyDimension { axis: VolumeAxis::Y });
    }
    Ok((width, height))
}

/// Runs the whole export: colour conversion, XY resampling, optional Z
/// resampling and atlas packing, in that order.
///
/// Nothing is allocated for the output until the size checks and the
/// confirmation gates have passed.
pub fn export(
    mut sequence: Sequence,
    config: ExportConfig,
    confirm: &impl Confirm,
) -> Result<AtlasExport> {
    if sequence.size_z() == 1 && sequence.size_t() > 1 && confirm.confirm(Confirmation::SwapZT) {
        info!("Swapping Z and T of '{}'", sequence.name);
        sequence.swap_zt();
    }
    if sequence.size_t() == 0 {
        return Err(ExportError::EmptyDimension { axis: VolumeAxis::T });
    }
    if sequence.size_z() == 0 {
        return Err(ExportError::EmptyDimension { axis: VolumeAxis::Z });
    }

    let (width, height) = output_dimensions(
        (sequence.size_x(), sequence.size_y(), sequence.size_z()),
        &config.scale,
    )?;

    if config.scale.resamples_z() {
        if sequence.size_z() < 2 {
            return Err(ExportError::NotEnoughSlices {
                depth: sequence.size_z(),
            });
        }
        if !confirm.confirm(Confirmation::SlowZScaling) {
            return Err(ExportError::Declined(Confirmation::SlowZScaling));
        }
    }

    let frame = match sequence.frame(config.time_index) {
        Some(frame) => frame,
        None => {
            warn!(
                "Time point {} does not exist for '{}', using time point 0",
                config.time_index, sequence.name
            );
            sequence
                .frame(0)
                .ok_or(ExportError::EmptyDimension { axis: VolumeAxis::T })?
        }
    };

    let started = Instant::now();
    let stack = sequence.lut.convert(frame)?;
    info!(
        "Converted {} channel(s) to RGBA in {:?}",
        sequence.size_c(),
        started.elapsed()
    );

    let started = Instant::now();
    let stack = Interpolator::resample_xy(stack, width, height);
    info!(
        "Scaled slices to {}x{} in {:?}",
        width,
        height,
        started.elapsed()
    );

    let stack = if config.scale.resamples_z() {
        let started = Instant::now();
        let stack = Interpolator::resample_z(&stack, config.scale.z)?;
        info!(
            "Scaled z to {} slices in {:?}",
            stack.depth(),
            started.elapsed()
        );
        stack
    } else {
        stack
    };

    let layout = AtlasLayout::new(stack.width(), stack.height(), stack.depth());
    debug!("Atlas layout: {layout:?}");

    let started = Instant::now();
    let atlases = AtlasSet::pack(&stack, layout)?;
    info!(
        "Packed {} slices into {} atlases of {}x{} in {:?}",
        stack.depth(),
        atlases.len(),
        layout.atlas_width,
        layout.atlas_height,
        started.elapsed()
    );

    let manifest = AtlasManifest::new(&config.name, &layout, config.scaled_voxel_size());
    Ok(AtlasExport { atlases, manifest })
}
