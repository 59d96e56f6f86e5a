//! Cortical surface representation.

use nalgebra::Point3;

/// A triangle face as three vertex indices.
///
/// Indices are stored as `f64` so faces travel alongside vertex coordinates
/// in the model's float tensors. They are integral values and are never
/// renumbered by preprocessing, only reordered within the triple.
pub type Face = [f64; 3];

/// A cortical surface mesh: vertex positions and triangle faces.
///
/// Unlike an indexed render mesh, faces are float-valued and are not
/// validated against the vertex count.
///
/// # Example
///
/// ```
/// use cortex_types::{Surface, Point3};
///
/// let surface = Surface::from_indices(
///     vec![
///         Point3::new(0.0, 0.0, 0.0),
///         Point3::new(1.0, 0.0, 0.0),
///         Point3::new(0.0, 1.0, 0.0),
///     ],
///     &[[0_u32, 1, 2]],
/// );
///
/// assert_eq!(surface.faces, vec![[0.0, 1.0, 2.0]]);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Surface {
    /// Vertex positions.
    pub vertices: Vec<Point3<f64>>,

    /// Triangle faces as float-valued vertex indices.
    pub faces: Vec<Face>,
}

impl Surface {
    /// Creates a surface from vertices and float-valued faces.
    #[inline]
    #[must_use]
    pub const fn new(vertices: Vec<Point3<f64>>, faces: Vec<Face>) -> Self {
        Self { vertices, faces }
    }

    /// Creates a surface, casting face indices of any numeric type to `f64`.
    ///
    /// Accepts `u32`, `i32`, `u16`, `f32` and `f64` indices.
    #[must_use]
    pub fn from_indices<F>(vertices: Vec<Point3<f64>>, faces: &[[F; 3]]) -> Self
    where
        F: Copy + Into<f64>,
    {
        Self {
            vertices,
            faces: faces.iter().map(|&face| face_to_f64(face)).collect(),
        }
    }

    /// Number of vertices.
    #[inline]
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of faces.
    #[inline]
    #[must_use]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Returns `true` if the surface has no vertices.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Splits the surface into its vertex and face arrays.
    #[inline]
    #[must_use]
    pub fn into_parts(self) -> (Vec<Point3<f64>>, Vec<Face>) {
        (self.vertices, self.faces)
    }
}

/// Casts one face of any numeric index type to a float-valued [`Face`].
#[inline]
pub fn face_to_f64<F: Copy + Into<f64>>(face: [F; 3]) -> Face {
    [face[0].into(), face[1].into(), face[2].into()]
}
