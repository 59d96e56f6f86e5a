//! Volume preprocessing.

use cortex_types::DatasetConvention;
use ndarray::{Array3, Array4, ArrayView3, Axis, s};
use tracing::debug;

use crate::error::PreprocessResult;
use crate::params::{ConventionParams, VolumeLayout};

/// Maps a raw MRI volume into the model frame for a dataset convention.
///
/// Returns a new `(1, D, H, W)` array; the input is never modified and the
/// output never shares memory with it.
///
/// - HCP: axes `(1, 2, 0)`, first and last axis reversed, cropped by
///   32/16/32 voxels on each end.
/// - ADNI: same permutation and reversal, no crop.
/// - dHCP: first axis zero-padded by 2 voxels on each end.
///
/// # Errors
///
/// Returns [`PreprocessError::VolumeTooSmall`](crate::PreprocessError::VolumeTooSmall)
/// if the volume is too small for the convention's crop.
///
/// # Example
///
/// ```
/// use cortex_preprocess::process_volume;
/// use cortex_types::DatasetConvention;
/// use ndarray::Array3;
///
/// let volume = Array3::<f32>::zeros((8, 9, 10));
/// let out = process_volume(&volume, DatasetConvention::Dhcp).unwrap();
/// assert_eq!(out.shape(), &[1, 12, 9, 10]);
/// ```
pub fn process_volume<T>(
    volume: &Array3<T>,
    convention: DatasetConvention,
) -> PreprocessResult<Array4<T>>
where
    T: Clone + Default,
{
    let out = ConventionParams::for_convention(convention).apply_volume(volume.view())?;
    debug!(
        convention = %convention,
        input = ?volume.shape(),
        output = ?out.shape(),
        "Processed volume"
    );
    Ok(out)
}

impl ConventionParams {
    /// Applies this parameter set's volume layout.
    ///
    /// # Errors
    ///
    /// See [`transform_volume`].
    pub fn apply_volume<T>(&self, volume: ArrayView3<'_, T>) -> PreprocessResult<Array4<T>>
    where
        T: Clone + Default,
    {
        transform_volume(volume, &self.volume)
    }
}

/// Applies a [`VolumeLayout`] to a volume.
///
/// Padding is filled with `T::default()`, which is zero for numeric types.
///
/// # Errors
///
/// Returns an error if the layout's axis order is invalid or an axis is
/// shorter than twice its crop.
pub fn transform_volume<T>(
    volume: ArrayView3<'_, T>,
    layout: &VolumeLayout,
) -> PreprocessResult<Array4<T>>
where
    T: Clone + Default,
{
    let (d0, d1, d2) = volume.dim();
    let shape = layout.output_shape([d0, d1, d2])?;

    let mut view = volume.permuted_axes(layout.axis_order);
    for (axis, &flip) in layout.flip.iter().enumerate() {
        if flip {
            view.invert_axis(Axis(axis));
        }
    }

    let (n0, n1, n2) = view.dim();
    let [c0, c1, c2] = layout.crop;
    let cropped = view.slice_move(s![c0..n0 - c0, c1..n1 - c1, c2..n2 - c2]);

    let [p0, p1, p2] = layout.pad;
    let mut out = Array3::from_elem((shape[1], shape[2], shape[3]), T::default());
    out.slice_mut(s![
        p0..shape[1] - p0,
        p1..shape[2] - p1,
        p2..shape[3] - p2
    ])
    .assign(&cropped);

    Ok(out.insert_axis(Axis(0)))
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_precision_loss
)]
mod tests {
    use super::*;
    use crate::PreprocessError;

    /// Volume whose value encodes its own index as `i * 10000 + j * 100 + k`.
    fn indexed_volume(shape: (usize, usize, usize)) -> Array3<i32> {
        Array3::from_shape_fn(shape, |(i, j, k)| (i * 10_000 + j * 100 + k) as i32)
    }

    fn encode(i: usize, j: usize, k: usize) -> i32 {
        (i * 10_000 + j * 100 + k) as i32
    }

    // ==================== Shape Tests ====================

    #[test]
    fn test_full_size_shapes() {
        let volume = Array3::<u8>::zeros((256, 256, 256));

        let hcp = process_volume(&volume, DatasetConvention::Hcp).unwrap();
        assert_eq!(hcp.shape(), &[1, 192, 224, 192]);

        let adni = process_volume(&volume, DatasetConvention::Adni).unwrap();
        assert_eq!(adni.shape(), &[1, 256, 256, 256]);

        let dhcp = process_volume(&volume, DatasetConvention::Dhcp).unwrap();
        assert_eq!(dhcp.shape(), &[1, 260, 256, 256]);
    }

    #[test]
    fn test_hcp_too_small() {
        let volume = Array3::<f32>::zeros((64, 63, 64));
        let err = process_volume(&volume, DatasetConvention::Hcp).unwrap_err();
        assert_eq!(
            err,
            PreprocessError::VolumeTooSmall {
                axis: 0,
                len: 63,
                crop: 32,
            }
        );
    }

    #[test]
    fn test_oversized_layout_is_rejected() {
        let volume = Array3::<f32>::zeros((4, 4, 4));

        let crop = VolumeLayout::IDENTITY.with_crop([0, 0, usize::MAX / 2 + 1]);
        assert!(matches!(
            transform_volume(volume.view(), &crop),
            Err(PreprocessError::VolumeTooSmall { axis: 2, .. })
        ));

        let pad = VolumeLayout::IDENTITY.with_pad([usize::MAX / 2, 0, 0]);
        assert!(matches!(
            transform_volume(volume.view(), &pad),
            Err(PreprocessError::ShapeOverflow { axis: 0, .. })
        ));
    }

    #[test]
    fn test_hcp_exact_crop_gives_empty_axis() {
        let volume = Array3::<f32>::zeros((64, 64, 32));
        let out = process_volume(&volume, DatasetConvention::Hcp).unwrap();
        assert_eq!(out.shape(), &[1, 0, 0, 0]);
    }

    // ==================== Voxel Mapping Tests ====================

    #[test]
    fn test_hcp_voxel_mapping() {
        // permuted (66, 34, 66), cropped down to 2x2x2
        let (n0, n1) = (66, 66);
        let volume = indexed_volume((n0, n1, 34));
        let out = process_volume(&volume, DatasetConvention::Hcp).unwrap();
        assert_eq!(out.shape(), &[1, 2, 2, 2]);

        for a in 0..2 {
            for b in 0..2 {
                for c in 0..2 {
                    let expected = encode(n0 - 1 - (c + 32), n1 - 1 - (a + 32), b + 16);
                    assert_eq!(out[[0, a, b, c]], expected, "voxel ({a}, {b}, {c})");
                }
            }
        }
    }

    #[test]
    fn test_adni_voxel_mapping() {
        let (n0, n1, n2) = (3, 4, 5);
        let volume = indexed_volume((n0, n1, n2));
        let out = process_volume(&volume, DatasetConvention::Adni).unwrap();
        assert_eq!(out.shape(), &[1, n1, n2, n0]);

        for ((_, a, b, c), &value) in out.indexed_iter() {
            assert_eq!(value, encode(n0 - 1 - c, n1 - 1 - a, b));
        }
    }

    #[test]
    fn test_dhcp_pads_first_axis_with_zeros() {
        let volume = indexed_volume((3, 4, 5)).mapv(|v| v + 1);
        let out = process_volume(&volume, DatasetConvention::Dhcp).unwrap();
        assert_eq!(out.shape(), &[1, 7, 4, 5]);

        for ((_, a, b, c), &value) in out.indexed_iter() {
            if a < 2 || a >= 5 {
                assert_eq!(value, 0);
            } else {
                assert_eq!(value, volume[[a - 2, b, c]]);
            }
        }
    }

    #[test]
    fn test_custom_layout_flip_and_pad() {
        let layout = VolumeLayout::IDENTITY
            .with_flip([false, false, true])
            .with_pad([0, 1, 0]);
        let volume = indexed_volume((1, 1, 3));
        let out = transform_volume(volume.view(), &layout).unwrap();
        assert_eq!(out.shape(), &[1, 1, 3, 3]);
        assert_eq!(out[[0, 0, 1, 0]], encode(0, 0, 2));
        assert_eq!(out[[0, 0, 1, 2]], encode(0, 0, 0));
        assert_eq!(out[[0, 0, 0, 1]], 0);
        assert_eq!(out[[0, 0, 2, 1]], 0);
    }

    // ==================== Purity Tests ====================

    /// One input per convention, large enough for the HCP clip to leave
    /// `(2, 2, 2)` voxels.
    fn convention_cases() -> [(DatasetConvention, (usize, usize, usize)); 3] {
        [
            (DatasetConvention::Hcp, (66, 66, 34)),
            (DatasetConvention::Adni, (4, 5, 6)),
            (DatasetConvention::Dhcp, (4, 5, 6)),
        ]
    }

    #[test]
    fn test_input_untouched_and_output_independent() {
        for (convention, shape) in convention_cases() {
            let volume = indexed_volume(shape);
            let original = volume.clone();

            let mut out = process_volume(&volume, convention).unwrap();
            assert!(!out.is_empty());
            out.fill(-1);

            assert_eq!(volume, original);
        }
    }

    #[test]
    fn test_output_is_standard_layout() {
        let volume = indexed_volume((4, 5, 6));
        let out = process_volume(&volume, DatasetConvention::Adni).unwrap();
        assert!(out.is_standard_layout());
    }

    #[test]
    fn test_deterministic() {
        for (convention, shape) in convention_cases() {
            let volume = Array3::from_shape_fn(shape, |(i, j, k)| {
                (i as f32).sin() + (j as f32) * 0.5 - (k as f32).sqrt()
            });
            let a = process_volume(&volume, convention).unwrap();
            let b = process_volume(&volume, convention).unwrap();
            let bits_a: Vec<u32> = a.iter().map(|v| v.to_bits()).collect();
            let bits_b: Vec<u32> = b.iter().map(|v| v.to_bits()).collect();
            assert_eq!(bits_a, bits_b);
        }
    }
}
