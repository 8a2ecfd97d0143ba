use crate::core::{MatF32, Point};

/// Draw a filled square marker centered on `center`, clipped to the image.
///
/// Used by the debug dumps to mark keypoint locations.
pub fn draw_marker(img: &mut MatF32, center: Point, half_size: u32, value: f32) {
    let rows = img.rows() as i64;
    let cols = img.cols() as i64;

    for dy in -(half_size as i64)..=half_size as i64 {
        for dx in -(half_size as i64)..=half_size as i64 {
            let y = center.y as i64 + dy;
            let x = center.x as i64 + dx;
            if y >= 0 && y < rows && x >= 0 && x < cols {
                img.set(y as usize, x as usize, value);
            }
        }
    }
}
