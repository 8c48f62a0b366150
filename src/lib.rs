//! # volume-atlas library
//!
//! This crate turns a 3D(+time) microscopy volume into the texture atlases
//! and layout manifest a WebGL volume viewer samples from.
//!
//! WebGL 1 has no 3D textures, so the viewer reconstructs the volume from a
//! fixed set of eight 2D atlases. One export run:
//!  - picks a time point (falling back to the first one if it is missing)
//!  - converts the samples to RGBA8 through the active lookup table, with an
//!    alpha ramp that never saturates before the colour does
//!  - scales the slices in X/Y and, on request, along Z
//!  - deals the z-slices round-robin across the atlases, with two empty
//!    padding slots at either end of the stack
//!
//!  Each axis is capped at 500 samples after scaling; [`pipeline::defaults`]
//!  suggests scales that stay under it. Z scaling is a slow per-voxel
//!  blend and has to be confirmed by the caller.
//!
//! # Examples
//!
//! ## Exporting a directory of z-slices
//!
//! Load every png/tif file in `stack/` as one z-slice, export with the
//! suggested scales and write the atlases to `out/stack/`.
//!
//! ```no_run
//! # use volume_atlas::{VolumeLoader, SortBy, VoxelSize, ExportConfig, AtlasWriter, export};
//! let sequence = VolumeLoader::load_from_directory("stack", SortBy::FileName, VoxelSize::default())
//!     .expect("should have loaded slices from directory");
//! let config = ExportConfig::for_sequence(&sequence);
//! let atlases = export(sequence, config, &true).expect("should have packed the volume");
//! AtlasWriter::new("out")
//!     .write(&atlases)
//!     .expect("should have written atlases");
//! ```

pub mod atlas;
pub mod color;
pub mod enums;
pub mod error;
pub mod geometry;
mod interpolator;
pub mod manifest;
pub mod pipeline;
pub mod volume;
pub mod volume_loader;
pub mod writer;

pub use atlas::AtlasSet;
pub use color::{LookupTable, LutChannel, Scaler};
pub use enums::{Confirmation, SortBy, VolumeAxis};
pub use error::{ExportError, Result};
pub use geometry::{AtlasLayout, SlicePlacement, next_power_of_two};
pub use manifest::AtlasManifest;
pub use pipeline::{
    AtlasExport, Confirm, ExportConfig, ExportDefaults, ScaleFactors, defaults, export,
};
pub use volume::{Sequence, Stack, VoxelSize};
pub use volume_loader::{VolumeLoader, VolumeLoaderError};
pub use writer::{AtlasWriter, validate_name};
