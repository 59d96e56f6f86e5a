//! Surface preprocessing and its inverse.

use cortex_types::{DatasetConvention, Point3, Surface, face_to_f64};
use tracing::{debug, warn};

use crate::error::PreprocessResult;
use crate::params::{ConventionParams, SurfaceAffine};

/// Maps a native cortical surface into the normalized model frame.
///
/// Face indices of any numeric type are cast to `f64`. Faces are copied
/// unchanged except for dHCP, whose face columns follow the vertex column
/// order `[2, 1, 0]`.
///
/// - HCP: columns `[0, 2, 1]`, second axis negated, shifted to match the
///   clipped volume, then `(v - (96, 112, 96)) / 112`.
/// - ADNI: `v / 96`.
/// - dHCP: columns `[2, 1, 0]`, then `(v - (104, 104, 78)) / 104`.
///
/// # Example
///
/// ```
/// use cortex_preprocess::process_surface;
/// use cortex_types::{DatasetConvention, Point3};
///
/// let vertices = [Point3::new(96.0, 0.0, 48.0)];
/// let surface = process_surface(&vertices, &[[0_u32, 1, 2]], DatasetConvention::Adni);
/// assert_eq!(surface.vertices[0], Point3::new(1.0, 0.0, 0.5));
/// assert_eq!(surface.faces[0], [0.0, 1.0, 2.0]);
/// ```
#[must_use]
pub fn process_surface<F>(
    vertices: &[Point3<f64>],
    faces: &[[F; 3]],
    convention: DatasetConvention,
) -> Surface
where
    F: Copy + Into<f64>,
{
    // presets are valid by construction
    let params = ConventionParams::for_convention(convention);
    let surface = map_forward(&params.surface, vertices, faces);
    debug!(
        convention = %convention,
        vertices = surface.vertex_count(),
        faces = surface.face_count(),
        "Processed surface"
    );
    surface
}

/// Maps a normalized surface back to the native frame of its dataset.
///
/// For HCP and dHCP this exactly undoes [`process_surface`], up to
/// floating-point round-off. ADNI maps back with `v * 104`, which does not
/// undo the forward `v / 96`; the constants come from the ADNI
/// pipeline and are kept as is.
///
/// # Example
///
/// ```
/// use cortex_preprocess::{process_surface, process_surface_inverse};
/// use cortex_types::{DatasetConvention, Point3};
///
/// let vertices = [Point3::new(120.0, 90.0, 60.0)];
/// let faces = [[4_u32, 5, 6]];
///
/// let normalized = process_surface(&vertices, &faces, DatasetConvention::Dhcp);
/// assert_eq!(normalized.faces[0], [6.0, 5.0, 4.0]);
///
/// let back = process_surface_inverse(
///     &normalized.vertices,
///     &normalized.faces,
///     DatasetConvention::Dhcp,
/// );
/// assert!((back.vertices[0] - vertices[0]).norm() < 1e-9);
/// assert_eq!(back.faces[0], [4.0, 5.0, 6.0]);
/// ```
#[must_use]
pub fn process_surface_inverse<F>(
    vertices: &[Point3<f64>],
    faces: &[[F; 3]],
    convention: DatasetConvention,
) -> Surface
where
    F: Copy + Into<f64>,
{
    let params = ConventionParams::for_convention(convention);
    if !params.is_invertible() {
        warn!(
            convention = %convention,
            forward_scale = params.surface.scale,
            inverse_scale = params.inverse.scale,
            "Inverse surface transform does not undo the forward transform"
        );
    }

    let surface = map_inverse(&params.inverse, vertices, faces);
    debug!(
        convention = %convention,
        vertices = surface.vertex_count(),
        faces = surface.face_count(),
        "Restored surface to native space"
    );
    surface
}

impl ConventionParams {
    /// Applies this parameter set's forward surface map.
    ///
    /// # Errors
    ///
    /// Returns an error if the forward affine fails
    /// [`SurfaceAffine::validate`].
    pub fn apply_surface<F>(
        &self,
        vertices: &[Point3<f64>],
        faces: &[[F; 3]],
    ) -> PreprocessResult<Surface>
    where
        F: Copy + Into<f64>,
    {
        forward_surface(&self.surface, vertices, faces)
    }

    /// Applies this parameter set's inverse surface map.
    ///
    /// # Errors
    ///
    /// Returns an error if the inverse affine fails
    /// [`SurfaceAffine::validate`].
    pub fn apply_surface_inverse<F>(
        &self,
        vertices: &[Point3<f64>],
        faces: &[[F; 3]],
    ) -> PreprocessResult<Surface>
    where
        F: Copy + Into<f64>,
    {
        inverse_surface(&self.inverse, vertices, faces)
    }
}

/// Maps a surface through `affine` into the normalized frame.
///
/// # Errors
///
/// Returns an error if `affine` fails [`SurfaceAffine::validate`].
pub fn forward_surface<F>(
    affine: &SurfaceAffine,
    vertices: &[Point3<f64>],
    faces: &[[F; 3]],
) -> PreprocessResult<Surface>
where
    F: Copy + Into<f64>,
{
    affine.validate()?;
    Ok(map_forward(affine, vertices, faces))
}

/// Maps a normalized surface back through the inverse of `affine`.
///
/// # Errors
///
/// Returns an error if `affine` fails [`SurfaceAffine::validate`].
pub fn inverse_surface<F>(
    affine: &SurfaceAffine,
    vertices: &[Point3<f64>],
    faces: &[[F; 3]],
) -> PreprocessResult<Surface>
where
    F: Copy + Into<f64>,
{
    affine.validate()?;
    Ok(map_inverse(affine, vertices, faces))
}

fn map_forward<F>(affine: &SurfaceAffine, vertices: &[Point3<f64>], faces: &[[F; 3]]) -> Surface
where
    F: Copy + Into<f64>,
{
    Surface::new(
        vertices.iter().map(|v| affine.forward_point(v)).collect(),
        faces
            .iter()
            .map(|&face| affine.forward_face(face_to_f64(face)))
            .collect(),
    )
}

fn map_inverse<F>(affine: &SurfaceAffine, vertices: &[Point3<f64>], faces: &[[F; 3]]) -> Surface
where
    F: Copy + Into<f64>,
{
    Surface::new(
        vertices.iter().map(|v| affine.inverse_point(v)).collect(),
        faces
            .iter()
            .map(|&face| affine.inverse_face(face_to_f64(face)))
            .collect(),
    )
}
