use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum VolumeAxis {
    X,
    Y,
    Z,
    T,
}

impl fmt::Display for VolumeAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VolumeAxis::X => write!(f, "X"),
            VolumeAxis::Y => write!(f, "Y"),
            VolumeAxis::Z => write!(f, "Z"),
            VolumeAxis::T => write!(f, "T"),
        }
    }
}

/// Questions the pipeline may put to whoever drives it before doing
/// anything irreversible or slow.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Confirmation {
    /// Z scaling below 0.999 runs the slow per-voxel resampler.
    SlowZScaling,
    /// The sequence has one z-slice but several time points.
    SwapZT,
}

impl fmt::Display for Confirmation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Confirmation::SlowZScaling => write!(
                f,
                "the built-in z-scaling algorithm is slow, consider scaling z with another tool"
            ),
            Confirmation::SwapZT => write!(
                f,
                "the sequence only has one z-slice, swap its Z and T dimensions"
            ),
        }
    }
}

#[derive(Default, Clone, Copy, Debug)]
pub enum SortBy {
    /// Natural order of the file names, so `slice_2` comes before `slice_10`.
    #[default]
    FileName,
    None,
}
