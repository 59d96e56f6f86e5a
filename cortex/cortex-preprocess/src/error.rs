//! Error types for preprocessing operations.

use cortex_types::ConventionError;
use thiserror::Error;

/// Result type for preprocessing operations.
pub type PreprocessResult<T> = Result<T, PreprocessError>;

/// Errors that can occur while preprocessing volumes and surfaces.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum PreprocessError {
    /// The dataset tag did not name a supported convention.
    #[error(transparent)]
    Convention(#[from] ConventionError),

    /// A volume axis is too short for the requested crop.
    #[error("volume axis {axis} has {len} voxels, cannot crop {crop} from each end")]
    VolumeTooSmall {
        /// Axis index in the permuted frame.
        axis: usize,
        /// Length of the axis before cropping.
        len: usize,
        /// Voxels removed from each end.
        crop: usize,
    },

    /// Padding an axis would overflow `usize`.
    #[error("volume axis {axis} with {len} voxels cannot be padded by {pad} on each end")]
    ShapeOverflow {
        /// Axis index in the permuted frame.
        axis: usize,
        /// Length of the axis after cropping.
        len: usize,
        /// Voxels added to each end.
        pad: usize,
    },

    /// An axis or column order is not a permutation of `[0, 1, 2]`.
    #[error("{what} {order:?} is not a permutation of [0, 1, 2]")]
    InvalidPermutation {
        /// Which order was invalid.
        what: &'static str,
        /// The offending order.
        order: [usize; 3],
    },

    /// A surface sign is neither `1.0` nor `-1.0`.
    #[error("axis {axis} sign must be 1 or -1, got {value}")]
    InvalidSign {
        /// Axis index.
        axis: usize,
        /// The offending value.
        value: f64,
    },

    /// The normalization scale is zero or not finite.
    #[error("normalization scale must be finite and non-zero, got {0}")]
    InvalidScale(f64),

    /// An offset or center component is NaN or infinite.
    #[error("{what}[{axis}] must be finite, got {value}")]
    NonFiniteParameter {
        /// Which parameter was invalid.
        what: &'static str,
        /// Axis index.
        axis: usize,
        /// The offending value.
        value: f64,
    },
}
