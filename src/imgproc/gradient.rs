use crate::core::MatF32;
use crate::error::Result;

/// Gradient magnitude at `(x, y)` from central differences.
///
/// The position must lie at least one pixel inside the image.
#[inline]
#[must_use]
pub fn gradient_magnitude(img: &MatF32, x: usize, y: usize) -> f32 {
    let dx = img.at(y, x + 1) - img.at(y, x - 1);
    let dy = img.at(y + 1, x) - img.at(y - 1, x);
    (dx * dx + dy * dy).sqrt()
}

/// Gradient orientation at `(x, y)` in degrees, in `[0, 360)`.
///
/// The position must lie at least one pixel inside the image.
#[inline]
#[must_use]
pub fn gradient_orientation(img: &MatF32, x: usize, y: usize) -> f32 {
    let dx = img.at(y, x + 1) - img.at(y, x - 1);
    let dy = img.at(y + 1, x) - img.at(y - 1, x);
    dy.atan2(dx).to_degrees().rem_euclid(360.0)
}

/// Full gradient magnitude and orientation maps for an image.
///
/// The one-pixel border ring is left at zero; only interior samples carry
/// gradient values.
pub fn gradient_maps(img: &MatF32) -> Result<(MatF32, MatF32)> {
    let rows = img.rows();
    let cols = img.cols();

    let mut magnitudes = MatF32::new(rows, cols)?;
    let mut orientations = MatF32::new(rows, cols)?;

    for y in 1..rows.saturating_sub(1) {
        for x in 1..cols.saturating_sub(1) {
            magnitudes.set(y, x, gradient_magnitude(img, x, y));
            orientations.set(y, x, gradient_orientation(img, x, y));
        }
    }

    Ok((magnitudes, orientations))
}
