use crate::core::{clamp_renormalize, normalize_l2, MatF32};
use crate::error::Result;
use crate::features2d::interest_point::Candidate;
use crate::features2d::orientation::{
    nearest_gauss_level, weighted_histogram, window_origin, GradientMaps, HALF_WINDOW,
};
use crate::features2d::pyramid::OctaveLevel;
use crate::imgproc::convolve_gauss;

/// Number of values in a SIFT descriptor: a 4x4 grid of sub-regions with
/// 8 orientation bins each.
pub const DESCRIPTOR_SIZE: usize = 128;

/// Sub-regions per window axis.
const GRID: usize = 4;

/// Orientation bins per sub-region.
const SUB_BINS: usize = 8;

/// Descriptor bins are clamped to this value after normalization so no
/// single gradient direction dominates under illumination change.
const DESCRIPTOR_CAP: f32 = 0.2;

/// Standard deviation of the magnitude reweighting over the window.
const WEIGHT_SIGMA: f32 = 1.6;

/// Build the 128-value descriptor for every candidate.
///
/// The 16x16 gradient window around a keypoint is rotated relative to the
/// keypoint orientation, split into a 4x4 grid of 4x4 sub-regions, and
/// each sub-region contributes an 8-bin orientation histogram of weighted
/// magnitudes. The concatenated vector is L2-normalized, clamped to 0.2
/// and renormalized. Keypoints whose window leaves the nearest Gaussian
/// level are marked filtered.
pub(crate) fn compute(
    candidates: &mut [Candidate],
    gaussians: &[Vec<OctaveLevel>],
    gradients: &[Vec<GradientMaps>],
) -> Result<()> {
    let r = HALF_WINDOW;

    for candidate in candidates.iter_mut() {
        let (octave, index) = nearest_gauss_level(gaussians, candidate.scale);
        let level = &gaussians[octave][index];
        let maps = &gradients[octave][index];

        let (row0, col0) = match window_origin(&level.img, candidate.loc) {
            Some(origin) => origin,
            None => {
                candidate.filtered = true;
                continue;
            }
        };

        let magnitudes = maps.magnitudes.window(row0, col0, 2 * r, 2 * r)?;
        let orientations = maps.orientations.window(row0, col0, 2 * r, 2 * r)?;
        let gauss_window = level.img.window(row0, col0, 2 * r, 2 * r)?;

        let rotated = rotate_orientations(&orientations, candidate.orientation)?;
        let weights = convolve_gauss(&gauss_window, WEIGHT_SIGMA)?;

        let cell = 2 * r / GRID;
        let mut descriptor = Vec::with_capacity(DESCRIPTOR_SIZE);
        for grid_row in 0..GRID {
            for grid_col in 0..GRID {
                let sub_orientations =
                    rotated.window(grid_row * cell, grid_col * cell, cell, cell)?;
                let sub_magnitudes =
                    magnitudes.window(grid_row * cell, grid_col * cell, cell, cell)?;
                let sub_weights = weights.window(grid_row * cell, grid_col * cell, cell, cell)?;

                descriptor.extend(weighted_histogram(
                    &sub_orientations,
                    &sub_magnitudes,
                    &sub_weights,
                    SUB_BINS,
                ));
            }
        }

        normalize_l2(&mut descriptor);
        clamp_renormalize(&mut descriptor, DESCRIPTOR_CAP);
        candidate.descriptor = descriptor;
    }

    Ok(())
}

/// Express gradient angles relative to the keypoint orientation by
/// subtracting it, wrapped back into `[0, 360)`.
fn rotate_orientations(orientations: &MatF32, keypoint_orientation: f32) -> Result<MatF32> {
    MatF32::from_fn(orientations.rows(), orientations.cols(), |row, col| {
        (orientations.at(row, col) - keypoint_orientation).rem_euclid(360.0)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Point;

    #[test]
    fn test_rotation_subtracts_keypoint_orientation() {
        let orientations = MatF32::from_vec(1, 4, vec![0.0, 90.0, 180.0, 350.0]).unwrap();
        let rotated = rotate_orientations(&orientations, 90.0).unwrap();

        assert!((rotated.at(0, 0) - 270.0).abs() < 1e-4);
        assert!((rotated.at(0, 1) - 0.0).abs() < 1e-4);
        assert!((rotated.at(0, 2) - 90.0).abs() < 1e-4);
        assert!((rotated.at(0, 3) - 260.0).abs() < 1e-4);
    }

    #[test]
    fn test_rotation_keeps_range() {
        let orientations =
            MatF32::from_fn(16, 16, |row, col| ((row * 23 + col * 7) % 360) as f32).unwrap();
        let rotated = rotate_orientations(&orientations, 123.4).unwrap();
        for &theta in rotated.data() {
            assert!((0.0..360.0).contains(&theta));
        }
    }

    fn descriptor_fixture() -> (Vec<Vec<OctaveLevel>>, Vec<Vec<GradientMaps>>) {
        // A textured level large enough for the 16x16 window
        let img = MatF32::from_fn(48, 48, |row, col| {
            ((row as f32 * 0.9).sin() + (col as f32 * 0.6).cos()) * 70.0 + 128.0
        })
        .unwrap();
        let gaussians = vec![vec![OctaveLevel { scale: 1.6, img }]];
        let gradients = crate::features2d::orientation::build_gradient_pyramid(&gaussians).unwrap();
        (gaussians, gradients)
    }

    #[test]
    fn test_descriptor_shape_and_bounds() {
        let (gaussians, gradients) = descriptor_fixture();
        let mut candidates = vec![Candidate::new(Point::new(24, 24), 0, 1, 1.6)];
        candidates[0].orientation = 40.0;

        compute(&mut candidates, &gaussians, &gradients).unwrap();
        let candidate = &candidates[0];

        assert!(!candidate.filtered);
        assert_eq!(candidate.descriptor.len(), DESCRIPTOR_SIZE);
        for &value in &candidate.descriptor {
            assert!(value >= 0.0);
            assert!(value <= DESCRIPTOR_CAP + 1e-6);
        }

        let norm_sq: f32 = candidate.descriptor.iter().map(|v| v * v).sum();
        assert!(norm_sq > 0.0);
        assert!(norm_sq <= 1.0 + 1e-4);
    }

    #[test]
    fn test_descriptor_deterministic() {
        let (gaussians, gradients) = descriptor_fixture();
        let mut first = vec![Candidate::new(Point::new(20, 28), 0, 1, 1.6)];
        let mut second = first.clone();

        compute(&mut first, &gaussians, &gradients).unwrap();
        compute(&mut second, &gaussians, &gradients).unwrap();
        assert_eq!(first[0].descriptor, second[0].descriptor);
    }

    #[test]
    fn test_out_of_window_keypoint_filtered() {
        let (gaussians, gradients) = descriptor_fixture();
        let mut candidates = vec![Candidate::new(Point::new(3, 24), 0, 1, 1.6)];

        compute(&mut candidates, &gaussians, &gradients).unwrap();
        assert!(candidates[0].filtered);
        assert!(candidates[0].descriptor.is_empty());
    }

    #[test]
    fn test_descriptor_depends_on_orientation() {
        let (gaussians, gradients) = descriptor_fixture();
        let mut zero = vec![Candidate::new(Point::new(24, 24), 0, 1, 1.6)];
        let mut rotated = zero.clone();
        rotated[0].orientation = 90.0;

        compute(&mut zero, &gaussians, &gradients).unwrap();
        compute(&mut rotated, &gaussians, &gradients).unwrap();
        assert_ne!(zero[0].descriptor, rotated[0].descriptor);
    }
}
