use crate::core::{parabola_vertex, MatF32, Point};
use crate::error::Result;
use crate::features2d::interest_point::Candidate;
use crate::features2d::pyramid::OctaveLevel;
use crate::imgproc::{convolve_gauss, gradient_maps};

/// Half-size of the square analysis window around a keypoint.
pub(crate) const HALF_WINDOW: usize = 8;

/// Fraction of the histogram maximum a bin must reach to count as a peak.
const PEAK_THRESHOLD: f32 = 0.8;

/// Per-level gradient maps of a Gaussian pyramid level.
pub(crate) struct GradientMaps {
    pub magnitudes: MatF32,
    pub orientations: MatF32,
}

/// Gradient magnitude and orientation maps for every Gaussian level.
pub(crate) fn build_gradient_pyramid(
    gaussians: &[Vec<OctaveLevel>],
) -> Result<Vec<Vec<GradientMaps>>> {
    gaussians
        .iter()
        .map(|octave| {
            octave
                .iter()
                .map(|level| {
                    let (magnitudes, orientations) = gradient_maps(&level.img)?;
                    Ok(GradientMaps {
                        magnitudes,
                        orientations,
                    })
                })
                .collect()
        })
        .collect()
}

/// The Gaussian level whose scale lies closest to `scale`, by absolute
/// difference across every octave and index. Ties resolve to the earlier
/// level so the lookup stays deterministic.
pub(crate) fn nearest_gauss_level(gaussians: &[Vec<OctaveLevel>], scale: f32) -> (usize, usize) {
    let mut best = (0, 0);
    let mut best_distance = f32::INFINITY;

    for (octave, levels) in gaussians.iter().enumerate() {
        for (index, level) in levels.iter().enumerate() {
            let distance = (level.scale - scale).abs();
            if distance < best_distance {
                best_distance = distance;
                best = (octave, index);
            }
        }
    }

    best
}

/// Top-left corner of the analysis window, or `None` when the keypoint
/// lies within [`HALF_WINDOW`] pixels of a border of `img`.
pub(crate) fn window_origin(img: &MatF32, loc: Point) -> Option<(usize, usize)> {
    let x = loc.x as usize;
    let y = loc.y as usize;
    let r = HALF_WINDOW;

    if x < r || y < r || x >= img.cols().saturating_sub(r) || y >= img.rows().saturating_sub(r) {
        return None;
    }
    Some((y - r, x - r))
}

/// Histogram of gradient orientations weighted by `magnitude * weight`,
/// with `bin_count` equal-width bins over `[0, 360)`. Bin indices wrap, so
/// an orientation of exactly 360 degrees lands in bin zero.
pub(crate) fn weighted_histogram(
    orientations: &MatF32,
    magnitudes: &MatF32,
    weights: &MatF32,
    bin_count: usize,
) -> Vec<f32> {
    let bin_width = 360.0 / bin_count as f32;
    let mut bins = vec![0.0f32; bin_count];

    for row in 0..orientations.rows() {
        for col in 0..orientations.cols() {
            let bin = (orientations.at(row, col) / bin_width).floor() as usize % bin_count;
            bins[bin] += magnitudes.at(row, col) * weights.at(row, col);
        }
    }

    bins
}

/// Dominant orientations of a 36-bin histogram, in degrees.
///
/// Bins below `PEAK_THRESHOLD` of the maximum are masked out; surviving
/// bins must be strict local maxima against their wrap-around neighbors.
/// Each peak is refined by a parabola through the bin and its neighbors,
/// read back in degrees at bin centers (`bin * 10 + 5`). A degenerate fit
/// falls back to the bin center itself.
fn extract_peaks(bins: &[f32]) -> Vec<f32> {
    let bin_count = bins.len();
    let max = bins.iter().fold(0.0f32, |acc, &b| acc.max(b));
    if max <= 0.0 {
        return Vec::new();
    }

    let mut peaks = Vec::new();
    for (bin, &value) in bins.iter().enumerate() {
        if value < PEAK_THRESHOLD * max {
            continue;
        }
        let left = bins[(bin + bin_count - 1) % bin_count];
        let right = bins[(bin + 1) % bin_count];
        if value <= left || value <= right {
            continue;
        }

        let vertex = parabola_vertex(
            (bin as f32 - 1.0, left),
            (bin as f32, value),
            (bin as f32 + 1.0, right),
        )
        .unwrap_or(bin as f32);
        peaks.push((vertex * 10.0 + 5.0).rem_euclid(360.0));
    }

    peaks
}

/// Assign a dominant orientation to every candidate.
///
/// Keypoints whose analysis window leaves the nearest Gaussian level are
/// marked filtered, as are keypoints with an empty histogram. When the
/// histogram carries several peaks, each extra peak spawns a duplicate
/// candidate differing only in orientation.
pub(crate) fn assign(
    candidates: Vec<Candidate>,
    gaussians: &[Vec<OctaveLevel>],
    gradients: &[Vec<GradientMaps>],
) -> Result<Vec<Candidate>> {
    let r = HALF_WINDOW;
    let mut out = Vec::with_capacity(candidates.len());

    for mut candidate in candidates {
        let (octave, index) = nearest_gauss_level(gaussians, candidate.scale);
        let level = &gaussians[octave][index];
        let maps = &gradients[octave][index];

        let (row0, col0) = match window_origin(&level.img, candidate.loc) {
            Some(origin) => origin,
            None => {
                candidate.filtered = true;
                out.push(candidate);
                continue;
            }
        };

        let magnitudes = maps.magnitudes.window(row0, col0, 2 * r, 2 * r)?;
        let orientations = maps.orientations.window(row0, col0, 2 * r, 2 * r)?;
        let gauss_window = level.img.window(row0, col0, 2 * r, 2 * r)?;
        let weights = convolve_gauss(&gauss_window, 1.5 * candidate.scale)?;

        let bins = weighted_histogram(&orientations, &magnitudes, &weights, 36);
        let peaks = extract_peaks(&bins);

        match peaks.split_first() {
            None => {
                candidate.filtered = true;
                out.push(candidate);
            }
            Some((first, rest)) => {
                candidate.orientation = *first;
                let duplicates: Vec<Candidate> = rest
                    .iter()
                    .map(|&peak| {
                        let mut duplicate = candidate.clone();
                        duplicate.orientation = peak;
                        duplicate
                    })
                    .collect();
                out.push(candidate);
                out.extend(duplicates);
            }
        }
    }

    Ok(out)
}
