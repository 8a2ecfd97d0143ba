use crate::core::MatF32;
use crate::error::{Error, Result};
use image::{ImageBuffer, Luma};
use std::path::Path;

/// Read an image from file as a greyscale float buffer.
///
/// Any format the `image` crate decodes is accepted; color images are
/// reduced to luma. Sample values land in `[0, 255]`.
pub fn imread_gray_f32<P: AsRef<Path>>(path: P) -> Result<MatF32> {
    let img = image::open(path)?.to_luma8();
    let (width, height) = img.dimensions();
    let data = img.into_raw().into_iter().map(f32::from).collect();

    MatF32::from_vec(height as usize, width as usize, data)
}

/// Write a greyscale float buffer to file.
///
/// Samples are clamped to `[0, 255]` and narrowed to 8 bits; the format
/// follows the file extension.
pub fn imwrite_gray_f32<P: AsRef<Path>>(path: P, mat: &MatF32) -> Result<()> {
    let data: Vec<u8> = mat
        .data()
        .iter()
        .map(|&v| v.clamp(0.0, 255.0) as u8)
        .collect();

    let buffer =
        ImageBuffer::<Luma<u8>, Vec<u8>>::from_raw(mat.cols() as u32, mat.rows() as u32, data)
            .ok_or_else(|| {
                Error::InvalidDimensions("Failed to create image buffer".to_string())
            })?;

    buffer.save(path)?;
    Ok(())
}
