use crate::core::MatF32;
use crate::error::Result;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Create a normalized 1D Gaussian kernel for the given standard deviation.
///
/// The kernel is truncated at three standard deviations and always has odd
/// length, at least 3.
#[must_use]
pub fn gaussian_kernel(sigma: f32) -> Vec<f32> {
    let radius = (3.0 * sigma).ceil().max(1.0) as usize;
    let size = 2 * radius + 1;

    let mut kernel = vec![0.0f32; size];
    let mut sum = 0.0;
    for (i, k) in kernel.iter_mut().enumerate() {
        let x = i as f32 - radius as f32;
        *k = (-x * x / (2.0 * sigma * sigma)).exp();
        sum += *k;
    }
    for k in &mut kernel {
        *k /= sum;
    }
    kernel
}

/// Convolve an image with a Gaussian of the given standard deviation.
///
/// Separable implementation: the 1D kernel runs along x, then along y.
/// Borders replicate the edge sample. Output shape equals input shape.
pub fn convolve_gauss(src: &MatF32, sigma: f32) -> Result<MatF32> {
    let kernel = gaussian_kernel(sigma);
    let tmp = convolve_rows(src, &kernel)?;
    convolve_cols(&tmp, &kernel)
}

/// Horizontal pass of the separable convolution
fn convolve_rows(src: &MatF32, kernel: &[f32]) -> Result<MatF32> {
    let rows = src.rows();
    let cols = src.cols();
    let radius = kernel.len() / 2;
    let src_data = src.data();

    let mut dst = MatF32::new(rows, cols)?;
    let dst_data = dst.data_mut();

    #[cfg(feature = "rayon")]
    let row_iter = dst_data.par_chunks_mut(cols).enumerate();
    #[cfg(not(feature = "rayon"))]
    let row_iter = dst_data.chunks_mut(cols).enumerate();

    row_iter.for_each(|(row, dst_row)| {
        let src_row = &src_data[row * cols..(row + 1) * cols];
        for (col, out) in dst_row.iter_mut().enumerate() {
            let mut value = 0.0;
            for (k, &weight) in kernel.iter().enumerate() {
                let c = (col as i64 + k as i64 - radius as i64).clamp(0, cols as i64 - 1) as usize;
                value += src_row[c] * weight;
            }
            *out = value;
        }
    });

    Ok(dst)
}

/// Vertical pass of the separable convolution
fn convolve_cols(src: &MatF32, kernel: &[f32]) -> Result<MatF32> {
    let rows = src.rows();
    let cols = src.cols();
    let radius = kernel.len() / 2;
    let src_data = src.data();

    let mut dst = MatF32::new(rows, cols)?;
    let dst_data = dst.data_mut();

    #[cfg(feature = "rayon")]
    let row_iter = dst_data.par_chunks_mut(cols).enumerate();
    #[cfg(not(feature = "rayon"))]
    let row_iter = dst_data.chunks_mut(cols).enumerate();

    row_iter.for_each(|(row, dst_row)| {
        for (k, &weight) in kernel.iter().enumerate() {
            let r = (row as i64 + k as i64 - radius as i64).clamp(0, rows as i64 - 1) as usize;
            let src_row = &src_data[r * cols..(r + 1) * cols];
            for (out, &s) in dst_row.iter_mut().zip(src_row) {
                *out += s * weight;
            }
        }
    });

    Ok(dst)
}

/// Blur with `sigma`, then halve both dimensions (ceiling-rounded) by
/// nearest-neighbor subsampling. No interpolation.
pub fn downsample_half(src: &MatF32, sigma: f32) -> Result<MatF32> {
    let blurred = convolve_gauss(src, sigma)?;
    let rows = (src.rows() + 1) / 2;
    let cols = (src.cols() + 1) / 2;

    MatF32::from_fn(rows, cols, |row, col| blurred.at(row * 2, col * 2))
}

/// Blur with `sigma`, then double both dimensions by nearest-neighbor
/// pixel duplication. No interpolation.
pub fn upsample_double(src: &MatF32, sigma: f32) -> Result<MatF32> {
    let blurred = convolve_gauss(src, sigma)?;

    MatF32::from_fn(src.rows() * 2, src.cols() * 2, |row, col| {
        blurred.at(row / 2, col / 2)
    })
}
