//! Per-dataset transform parameters.
//!
//! Every convention is described by data rather than by code branches: a
//! [`VolumeLayout`] for the image and a pair of [`SurfaceAffine`]s for the
//! surface (forward, and the one used to go back). Volume and surface read
//! the same [`ConventionParams`], which keeps the voxel/vertex
//! correspondence in one place.

use cortex_types::{DatasetConvention, Face, Point3};
use nalgebra::Matrix4;
use serde::{Deserialize, Serialize};

use crate::error::{PreprocessError, PreprocessResult};

/// Axis permutation, reversal, crop and pad applied to a volume.
///
/// Steps run in field order. `axis_order[i]` is the input axis that becomes
/// output axis `i`; `flip`, `crop` and `pad` are indexed in the permuted
/// frame. `crop[i]` and `pad[i]` count voxels removed/added on *each* end.
///
/// # Example
///
/// ```
/// use cortex_preprocess::VolumeLayout;
///
/// let layout = VolumeLayout::new([1, 2, 0]).with_crop([32, 16, 32]);
/// assert_eq!(layout.output_shape([256, 256, 256]).unwrap(), [1, 192, 224, 192]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VolumeLayout {
    /// Source axis for each output axis.
    pub axis_order: [usize; 3],

    /// Reverse the axis after permutation.
    pub flip: [bool; 3],

    /// Voxels cropped from each end of the axis.
    pub crop: [usize; 3],

    /// Zero voxels padded onto each end of the axis.
    pub pad: [usize; 3],
}

impl Default for VolumeLayout {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl VolumeLayout {
    /// Leaves the volume as is (apart from the channel axis).
    pub const IDENTITY: Self = Self::new([0, 1, 2]);

    /// Creates a layout with the given axis order and no flip, crop or pad.
    #[must_use]
    pub const fn new(axis_order: [usize; 3]) -> Self {
        Self {
            axis_order,
            flip: [false; 3],
            crop: [0; 3],
            pad: [0; 3],
        }
    }

    /// Sets which axes are reversed.
    #[must_use]
    pub const fn with_flip(mut self, flip: [bool; 3]) -> Self {
        self.flip = flip;
        self
    }

    /// Sets the per-axis crop.
    #[must_use]
    pub const fn with_crop(mut self, crop: [usize; 3]) -> Self {
        self.crop = crop;
        self
    }

    /// Sets the per-axis zero padding.
    #[must_use]
    pub const fn with_pad(mut self, pad: [usize; 3]) -> Self {
        self.pad = pad;
        self
    }

    /// Validates the layout.
    ///
    /// # Errors
    ///
    /// Returns [`PreprocessError::InvalidPermutation`] if `axis_order` is not
    /// a permutation of `[0, 1, 2]`.
    pub fn validate(&self) -> PreprocessResult<()> {
        check_permutation("axis order", self.axis_order)
    }

    /// Shape of the transformed volume, including the leading channel axis.
    ///
    /// # Errors
    ///
    /// Returns [`PreprocessError::VolumeTooSmall`] if an axis is shorter than
    /// twice its crop, [`PreprocessError::ShapeOverflow`] if padding would not
    /// fit in `usize`, or [`PreprocessError::InvalidPermutation`] for a bad
    /// axis order.
    pub fn output_shape(&self, input: [usize; 3]) -> PreprocessResult<[usize; 4]> {
        self.validate()?;
        let mut shape = [1; 4];
        for axis in 0..3 {
            let len = input[self.axis_order[axis]];
            let crop = self.crop[axis];
            let kept = crop
                .checked_mul(2)
                .and_then(|both_ends| len.checked_sub(both_ends))
                .ok_or(PreprocessError::VolumeTooSmall { axis, len, crop })?;
            let pad = self.pad[axis];
            shape[axis + 1] = pad
                .checked_mul(2)
                .and_then(|both_ends| kept.checked_add(both_ends))
                .ok_or(PreprocessError::ShapeOverflow {
                    axis,
                    len: kept,
                    pad,
                })?;
        }
        Ok(shape)
    }
}

/// Affine map from native surface coordinates to the normalized frame.
///
/// Forward, for each output column `i`:
///
/// ```text
/// p_i   = v[column_order[i]]
/// q_i   = sign_i * p_i + offset_i
/// out_i = (q_i - center_i) / scale
/// ```
///
/// The inverse runs the same steps backwards. When `permute_faces` is set,
/// face columns are reordered with `column_order` too.
///
/// # Example
///
/// ```
/// use cortex_preprocess::SurfaceAffine;
/// use cortex_types::Point3;
///
/// let affine = SurfaceAffine::scaling(2.0).with_center([1.0, 1.0, 1.0]);
/// let out = affine.forward_point(&Point3::new(3.0, 5.0, 1.0));
/// assert_eq!(out, Point3::new(1.0, 2.0, 0.0));
/// assert_eq!(affine.inverse_point(&out), Point3::new(3.0, 5.0, 1.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfaceAffine {
    /// Source column for each output column.
    pub column_order: [usize; 3],

    /// Per-axis sign, `1.0` or `-1.0`, applied after the permutation.
    pub sign: [f64; 3],

    /// Per-axis offset added after the sign.
    pub offset: [f64; 3],

    /// Point subtracted before scaling.
    pub center: [f64; 3],

    /// Uniform divisor.
    pub scale: f64,

    /// Reorder face columns with `column_order`.
    pub permute_faces: bool,
}

impl SurfaceAffine {
    /// A uniform scale with no permutation, sign change or translation.
    #[must_use]
    pub const fn scaling(scale: f64) -> Self {
        Self {
            column_order: [0, 1, 2],
            sign: [1.0; 3],
            offset: [0.0; 3],
            center: [0.0; 3],
            scale,
            permute_faces: false,
        }
    }

    /// Sets the column order.
    #[must_use]
    pub const fn with_column_order(mut self, column_order: [usize; 3]) -> Self {
        self.column_order = column_order;
        self
    }

    /// Sets the per-axis sign.
    #[must_use]
    pub const fn with_sign(mut self, sign: [f64; 3]) -> Self {
        self.sign = sign;
        self
    }

    /// Sets the per-axis offset.
    #[must_use]
    pub const fn with_offset(mut self, offset: [f64; 3]) -> Self {
        self.offset = offset;
        self
    }

    /// Sets the center subtracted before scaling.
    #[must_use]
    pub const fn with_center(mut self, center: [f64; 3]) -> Self {
        self.center = center;
        self
    }

    /// Reorders face columns along with vertex columns.
    #[must_use]
    pub const fn with_face_permutation(mut self) -> Self {
        self.permute_faces = true;
        self
    }

    /// The column order that undoes `column_order`.
    ///
    /// # Panics
    ///
    /// Panics if an entry of `column_order` is 3 or more. Run
    /// [`SurfaceAffine::validate`] on untrusted parameters first.
    #[must_use]
    pub fn inverse_column_order(&self) -> [usize; 3] {
        let mut inverse = [0; 3];
        for (i, &source) in self.column_order.iter().enumerate() {
            inverse[source] = i;
        }
        inverse
    }

    /// Maps a native point into the normalized frame.
    ///
    /// # Panics
    ///
    /// Panics if an entry of `column_order` is 3 or more. Run
    /// [`SurfaceAffine::validate`] on untrusted parameters first.
    #[must_use]
    pub fn forward_point(&self, v: &Point3<f64>) -> Point3<f64> {
        let mut out = Point3::origin();
        for i in 0..3 {
            let q = self.sign[i] * v[self.column_order[i]] + self.offset[i];
            out[i] = (q - self.center[i]) / self.scale;
        }
        out
    }

    /// Maps a normalized point back to the native frame.
    ///
    /// # Panics
    ///
    /// Panics if an entry of `column_order` is 3 or more. Run
    /// [`SurfaceAffine::validate`] on untrusted parameters first.
    #[must_use]
    pub fn inverse_point(&self, v: &Point3<f64>) -> Point3<f64> {
        let mut out = Point3::origin();
        for i in 0..3 {
            let q = v[i] * self.scale + self.center[i];
            out[self.column_order[i]] = self.sign[i] * (q - self.offset[i]);
        }
        out
    }

    /// Reorders a face's columns for the normalized frame.
    ///
    /// # Panics
    ///
    /// Panics if an entry of `column_order` is 3 or more. Run
    /// [`SurfaceAffine::validate`] on untrusted parameters first.
    #[must_use]
    pub fn forward_face(&self, face: Face) -> Face {
        if self.permute_faces {
            self.column_order.map(|source| face[source])
        } else {
            face
        }
    }

    /// Restores a face's native column order.
    ///
    /// # Panics
    ///
    /// Panics if an entry of `column_order` is 3 or more. Run
    /// [`SurfaceAffine::validate`] on untrusted parameters first.
    #[must_use]
    pub fn inverse_face(&self, face: Face) -> Face {
        if self.permute_faces {
            self.inverse_column_order().map(|source| face[source])
        } else {
            face
        }
    }

    /// The forward map as a homogeneous matrix.
    #[must_use]
    pub fn forward_matrix(&self) -> Matrix4<f64> {
        let mut m = Matrix4::zeros();
        for i in 0..3 {
            m[(i, self.column_order[i])] = self.sign[i] / self.scale;
            m[(i, 3)] = (self.offset[i] - self.center[i]) / self.scale;
        }
        m[(3, 3)] = 1.0;
        m
    }

    /// The inverse map as a homogeneous matrix.
    #[must_use]
    pub fn inverse_matrix(&self) -> Matrix4<f64> {
        let mut m = Matrix4::zeros();
        for i in 0..3 {
            let row = self.column_order[i];
            m[(row, i)] = self.sign[i] * self.scale;
            m[(row, 3)] = self.sign[i] * (self.center[i] - self.offset[i]);
        }
        m[(3, 3)] = 1.0;
        m
    }

    /// Validates the affine.
    ///
    /// # Errors
    ///
    /// Returns an error if the column order is not a permutation, a sign is
    /// not ±1, the scale is zero or not finite, or an offset/center component
    /// is not finite.
    #[allow(clippy::float_cmp)]
    pub fn validate(&self) -> PreprocessResult<()> {
        check_permutation("column order", self.column_order)?;

        for (axis, &value) in self.sign.iter().enumerate() {
            if value != 1.0 && value != -1.0 {
                return Err(PreprocessError::InvalidSign { axis, value });
            }
        }

        if !self.scale.is_finite() || self.scale == 0.0 {
            return Err(PreprocessError::InvalidScale(self.scale));
        }

        check_finite("offset", self.offset)?;
        check_finite("center", self.center)
    }
}

/// The complete parameter set for one dataset convention.
///
/// `inverse` normally equals `surface`. It is a separate field because the
/// ADNI pipeline maps model output back with different constants than it
/// uses on the way in.
///
/// # Example
///
/// ```
/// use cortex_preprocess::ConventionParams;
/// use cortex_types::DatasetConvention;
///
/// let params = ConventionParams::for_convention(DatasetConvention::Dhcp);
/// assert_eq!(params.volume.pad, [2, 0, 0]);
/// assert!(params.is_invertible());
/// assert!(!ConventionParams::for_convention(DatasetConvention::Adni).is_invertible());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConventionParams {
    /// Volume layout.
    pub volume: VolumeLayout,

    /// Surface map into the normalized frame.
    pub surface: SurfaceAffine,

    /// Affine whose inverse maps normalized surfaces back to native space.
    pub inverse: SurfaceAffine,
}

impl ConventionParams {
    /// HCP: FreeSurfer conformed 256³ volumes, clipped to 192×224×192.
    pub const HCP: Self = Self::symmetric(
        VolumeLayout::new([1, 2, 0])
            .with_flip([true, false, true])
            .with_crop([32, 16, 32]),
        SurfaceAffine::scaling(112.0)
            .with_column_order([0, 2, 1])
            .with_sign([1.0, -1.0, 1.0])
            // 128 - 32, 128 - 15, 128 - 32
            .with_offset([96.0, 113.0, 96.0])
            .with_center([96.0, 112.0, 96.0]),
    );

    /// ADNI: MNI-152 registered volumes, kept at full extent.
    pub const ADNI: Self = Self {
        volume: VolumeLayout::new([1, 2, 0]).with_flip([true, false, true]),
        surface: SurfaceAffine::scaling(96.0),
        // v * 104 + [88, 104, 88] - 128 + [40, 24, 40]
        inverse: SurfaceAffine::scaling(104.0)
            .with_offset([128.0 - 40.0, 128.0 - 24.0, 128.0 - 40.0])
            .with_center([88.0, 104.0, 88.0]),
    };

    /// dHCP: neonatal volumes padded along the first axis.
    pub const DHCP: Self = Self::symmetric(
        VolumeLayout::IDENTITY.with_pad([2, 0, 0]),
        SurfaceAffine::scaling(104.0)
            .with_column_order([2, 1, 0])
            .with_center([104.0, 104.0, 78.0])
            .with_face_permutation(),
    );

    /// Parameters whose inverse is the exact inverse of the forward map.
    #[must_use]
    pub const fn symmetric(volume: VolumeLayout, surface: SurfaceAffine) -> Self {
        Self {
            volume,
            surface,
            inverse: surface,
        }
    }

    /// The preset for a dataset convention.
    #[must_use]
    pub const fn for_convention(convention: DatasetConvention) -> Self {
        match convention {
            DatasetConvention::Hcp => Self::HCP,
            DatasetConvention::Adni => Self::ADNI,
            DatasetConvention::Dhcp => Self::DHCP,
        }
    }

    /// Replaces the volume layout.
    #[must_use]
    pub const fn with_volume(mut self, volume: VolumeLayout) -> Self {
        self.volume = volume;
        self
    }

    /// Returns `true` if mapping a surface forward and back restores it.
    #[must_use]
    pub fn is_invertible(&self) -> bool {
        self.surface == self.inverse
    }

    /// Validates every part of the parameter set.
    ///
    /// # Errors
    ///
    /// Returns the first error reported by [`VolumeLayout::validate`] or
    /// [`SurfaceAffine::validate`].
    pub fn validate(&self) -> PreprocessResult<()> {
        self.volume.validate()?;
        self.surface.validate()?;
        self.inverse.validate()
    }
}

impl From<DatasetConvention> for ConventionParams {
    fn from(convention: DatasetConvention) -> Self {
        Self::for_convention(convention)
    }
}

fn check_permutation(what: &'static str, order: [usize; 3]) -> PreprocessResult<()> {
    let mut seen = [false; 3];
    for &axis in &order {
        if axis >= 3 || seen[axis] {
            return Err(PreprocessError::InvalidPermutation { what, order });
        }
        seen[axis] = true;
    }
    Ok(())
}

fn check_finite(what: &'static str, values: [f64; 3]) -> PreprocessResult<()> {
    match values.iter().position(|v| !v.is_finite()) {
        Some(axis) => Err(PreprocessError::NonFiniteParameter {
            what,
            axis,
            value: values[axis],
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Vector4;

    // ==================== VolumeLayout Tests ====================

    #[test]
    fn test_output_shapes_for_256_cube() {
        let input = [256, 256, 256];
        assert_eq!(
            ConventionParams::HCP.volume.output_shape(input).unwrap(),
            [1, 192, 224, 192]
        );
        assert_eq!(
            ConventionParams::ADNI.volume.output_shape(input).unwrap(),
            [1, 256, 256, 256]
        );
        assert_eq!(
            ConventionParams::DHCP.volume.output_shape(input).unwrap(),
            [1, 260, 256, 256]
        );
    }

    #[test]
    fn test_output_shape_follows_axis_order() {
        let layout = VolumeLayout::new([1, 2, 0]);
        assert_eq!(layout.output_shape([4, 5, 6]).unwrap(), [1, 5, 6, 4]);
    }

    #[test]
    fn test_output_shape_huge_crop_is_too_small() {
        let crop = usize::MAX / 2 + 1;
        let layout = VolumeLayout::IDENTITY.with_crop([crop, 0, 0]);
        layout.validate().unwrap();
        assert_eq!(
            layout.output_shape([4, 4, 4]).unwrap_err(),
            PreprocessError::VolumeTooSmall {
                axis: 0,
                len: 4,
                crop,
            }
        );
    }

    #[test]
    fn test_output_shape_huge_pad_overflows() {
        let pad = usize::MAX / 2;
        let layout = VolumeLayout::IDENTITY.with_pad([pad, 0, 0]);
        layout.validate().unwrap();
        assert_eq!(
            layout.output_shape([4, 4, 4]).unwrap_err(),
            PreprocessError::ShapeOverflow {
                axis: 0,
                len: 4,
                pad,
            }
        );

        // from a config file, same outcome
        let json = format!(
            r#"{{"axis_order":[0,1,2],"flip":[false,false,false],"crop":[0,0,0],"pad":[0,{pad},0]}}"#
        );
        let layout: VolumeLayout = serde_json::from_str(&json).unwrap();
        assert!(matches!(
            layout.output_shape([4, 4, 4]),
            Err(PreprocessError::ShapeOverflow { axis: 1, .. })
        ));
    }

    #[test]
    fn test_output_shape_too_small() {
        let err = ConventionParams::HCP
            .volume
            .output_shape([100, 20, 100])
            .unwrap_err();
        // input axis 1 becomes output axis 0, which crops 32
        assert_eq!(
            err,
            PreprocessError::VolumeTooSmall {
                axis: 0,
                len: 20,
                crop: 32,
            }
        );
    }

    #[test]
    fn test_layout_rejects_bad_order() {
        let err = VolumeLayout::new([0, 0, 1]).validate().unwrap_err();
        assert!(matches!(err, PreprocessError::InvalidPermutation { .. }));
        assert!(VolumeLayout::new([0, 1, 3]).validate().is_err());
    }

    // ==================== SurfaceAffine Tests ====================

    #[test]
    fn test_inverse_column_order() {
        assert_eq!(ConventionParams::HCP.surface.inverse_column_order(), [0, 2, 1]);
        assert_eq!(ConventionParams::DHCP.surface.inverse_column_order(), [2, 1, 0]);

        let cycle = SurfaceAffine::scaling(1.0).with_column_order([1, 2, 0]);
        assert_eq!(cycle.inverse_column_order(), [2, 0, 1]);
    }

    #[test]
    fn test_cycle_roundtrip() {
        let affine = SurfaceAffine::scaling(3.0)
            .with_column_order([1, 2, 0])
            .with_sign([-1.0, 1.0, -1.0])
            .with_offset([5.0, -7.0, 11.0])
            .with_center([1.0, 2.0, 3.0]);
        let p = Point3::new(10.0, 20.0, 30.0);
        let back = affine.inverse_point(&affine.forward_point(&p));
        assert_relative_eq!(back, p, epsilon = 1e-12);
    }

    #[test]
    fn test_hcp_forward_matches_step_chain() {
        let v = Point3::new(100.0, 50.0, 20.0);
        // permute [0, 2, 1] -> (100, 20, 50)
        // (100 - 32, -20 - 15, 50 - 32) + 128 = (196, 93, 146)
        // ((196, 93, 146) - (96, 112, 96)) / 112
        let expected = Point3::new(100.0 / 112.0, -19.0 / 112.0, 50.0 / 112.0);
        let out = ConventionParams::HCP.surface.forward_point(&v);
        assert_relative_eq!(out, expected, epsilon = 1e-12);
    }

    #[test]
    fn test_face_permutation() {
        let dhcp = ConventionParams::DHCP.surface;
        assert_eq!(dhcp.forward_face([1.0, 2.0, 3.0]), [3.0, 2.0, 1.0]);
        assert_eq!(dhcp.inverse_face([3.0, 2.0, 1.0]), [1.0, 2.0, 3.0]);

        // HCP permutes vertices but never faces
        let hcp = ConventionParams::HCP.surface;
        assert_eq!(hcp.forward_face([1.0, 2.0, 3.0]), [1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_matrices_agree_with_pointwise_maps() {
        let p = Point3::new(37.0, -12.5, 140.25);
        for convention in DatasetConvention::ALL {
            let params = ConventionParams::for_convention(convention);

            let forward = params.surface.forward_matrix() * Vector4::new(p.x, p.y, p.z, 1.0);
            let expected = params.surface.forward_point(&p);
            assert_relative_eq!(forward.xyz(), expected.coords, epsilon = 1e-12);

            let inverse = params.inverse.inverse_matrix() * Vector4::new(p.x, p.y, p.z, 1.0);
            let expected = params.inverse.inverse_point(&p);
            assert_relative_eq!(inverse.xyz(), expected.coords, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_symmetric_matrices_are_inverses() {
        for params in [ConventionParams::HCP, ConventionParams::DHCP] {
            let product = params.inverse.inverse_matrix() * params.surface.forward_matrix();
            assert_relative_eq!(product, Matrix4::identity(), epsilon = 1e-12);
        }
    }

    #[test]
    fn test_affine_validation() {
        assert!(SurfaceAffine::scaling(1.0).validate().is_ok());

        let err = SurfaceAffine::scaling(0.0).validate().unwrap_err();
        assert_eq!(err, PreprocessError::InvalidScale(0.0));

        assert!(SurfaceAffine::scaling(f64::NAN).validate().is_err());

        let err = SurfaceAffine::scaling(1.0)
            .with_sign([1.0, 0.5, 1.0])
            .validate()
            .unwrap_err();
        assert_eq!(err, PreprocessError::InvalidSign { axis: 1, value: 0.5 });

        let err = SurfaceAffine::scaling(1.0)
            .with_center([0.0, 0.0, f64::INFINITY])
            .validate()
            .unwrap_err();
        assert!(matches!(
            err,
            PreprocessError::NonFiniteParameter {
                what: "center",
                axis: 2,
                ..
            }
        ));
    }

    // ==================== ConventionParams Tests ====================

    #[test]
    fn test_presets_validate() {
        for convention in DatasetConvention::ALL {
            ConventionParams::for_convention(convention).validate().unwrap();
        }
    }

    #[test]
    fn test_only_adni_is_asymmetric() {
        assert!(ConventionParams::HCP.is_invertible());
        assert!(ConventionParams::DHCP.is_invertible());
        assert!(!ConventionParams::ADNI.is_invertible());
    }

    #[test]
    fn test_adni_inverse_offsets_come_from_acquisition_shift() {
        let inverse = ConventionParams::ADNI.inverse;
        let shift = [40.0, 24.0, 40.0];
        for axis in 0..3 {
            assert_eq!(inverse.offset[axis], 128.0 - shift[axis]);
            assert_eq!(inverse.center[axis], inverse.offset[axis]);
        }
        assert_eq!(inverse.scale, 104.0);
    }

    #[test]
    fn test_adni_inverse_is_plain_scale() {
        let back = ConventionParams::ADNI
            .inverse
            .inverse_point(&Point3::new(1.0, -0.5, 0.25));
        assert_relative_eq!(back, Point3::new(104.0, -52.0, 26.0), epsilon = 1e-12);
    }

    #[test]
    fn test_with_volume_keeps_surface() {
        let tuned = ConventionParams::ADNI.with_volume(
            ConventionParams::ADNI.volume.with_crop([8, 8, 8]),
        );
        assert_eq!(tuned.surface, ConventionParams::ADNI.surface);
        assert_eq!(tuned.volume.crop, [8, 8, 8]);
    }

    #[test]
    fn test_serde_roundtrip() {
        let json = serde_json::to_string(&ConventionParams::HCP).unwrap();
        let back: ConventionParams = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ConventionParams::HCP);
    }
}
