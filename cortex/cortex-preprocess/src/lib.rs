//! Volume and cortical surface preprocessing for geometric learning.
//!
//! This crate maps raw MRI volumes and cortical surfaces from three
//! acquisition protocols into one model-ready frame, and maps predicted
//! surfaces back:
//!
//! - [`process_volume`] - Permute, flip, clip/pad a volume and add a channel axis
//! - [`process_surface`] - Move surface vertices (and dHCP face columns) into the volume's frame
//! - [`process_surface_inverse`] - Map normalized surfaces back to native space
//! - [`ConventionParams`] - The per-dataset constants behind all three
//!
//! # Correspondence
//!
//! A surface vertex and the voxel it lies in must describe the same
//! anatomical point after preprocessing. Both transforms read the same
//! [`ConventionParams`] preset, so a change to one dataset's clipping has to
//! be mirrored in its surface offsets there.
//!
//! # Layer 0
//!
//! This is a Layer 0 crate with zero Bevy dependencies. Functions are pure:
//! inputs are borrowed, outputs are freshly allocated.
//!
//! # Example
//!
//! ```
//! use cortex_preprocess::{process_surface, process_surface_inverse, process_volume};
//! use cortex_types::{DatasetConvention, Point3};
//! use ndarray::Array3;
//!
//! let convention: DatasetConvention = "hcp".parse().unwrap();
//!
//! let volume = Array3::<f32>::zeros((128, 128, 64));
//! let image = process_volume(&volume, convention).unwrap();
//! assert_eq!(image.shape(), &[1, 64, 32, 64]);
//!
//! let vertices = vec![Point3::new(10.0, 20.0, 30.0)];
//! let faces = vec![[0_u32, 0, 0]];
//! let normalized = process_surface(&vertices, &faces, convention);
//! let restored = process_surface_inverse(&normalized.vertices, &normalized.faces, convention);
//! assert!((restored.vertices[0] - vertices[0]).norm() < 1e-9);
//! ```
//!
//! # ADNI
//!
//! The ADNI inverse multiplies by 104 while the forward map divides by 96.
//! The constants are kept exactly as the ADNI pipeline defines them;
//! [`ConventionParams::is_invertible`] reports `false` for that preset.

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod error;
mod params;
mod surface;
mod volume;

pub use error::{PreprocessError, PreprocessResult};
pub use params::{ConventionParams, SurfaceAffine, VolumeLayout};
pub use surface::{forward_surface, inverse_surface, process_surface, process_surface_inverse};
pub use volume::{process_volume, transform_volume};

// Re-export the shared types for convenience
pub use cortex_types::{ConventionError, DatasetConvention, Face, Surface};
