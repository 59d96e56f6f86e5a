//! Core types for cortical MRI preprocessing.
//!
//! This crate provides the data types shared by the preprocessing pipeline:
//!
//! - [`DatasetConvention`] - The acquisition protocol a volume/surface pair comes from
//! - [`Surface`] - A cortical surface as vertex positions plus float-valued faces
//! - [`Face`] - One triangle, three vertex indices stored as `f64`
//! - [`ConventionError`] - Raised when a dataset tag is not recognized
//!
//! # Layer 0 Crate
//!
//! This is a Layer 0 crate with **zero Bevy dependencies** and no array
//! backend. Volume handling lives in `cortex-preprocess`.
//!
//! # Coordinate Frames
//!
//! Every convention has a native frame (scanner/FreeSurfer voxel space for
//! that dataset) and a normalized frame, roughly `[-1, 1]` per axis, in which
//! the model consumes surfaces. The mapping between the two is owned by
//! `cortex-preprocess`; this crate only names the conventions.
//!
//! # Example
//!
//! ```
//! use cortex_types::{DatasetConvention, Surface, Point3};
//!
//! let convention: DatasetConvention = "dhcp".parse().unwrap();
//! assert_eq!(convention, DatasetConvention::Dhcp);
//!
//! let surface = Surface::new(vec![Point3::new(1.0, 2.0, 3.0)], vec![[0.0, 0.0, 0.0]]);
//! assert_eq!(surface.vertex_count(), 1);
//! ```

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod convention;
mod error;
mod surface;

pub use convention::DatasetConvention;
pub use error::ConventionError;
pub use surface::{Face, Surface, face_to_f64};

// Re-export nalgebra types for convenience
pub use nalgebra::{Point3, Vector3};
