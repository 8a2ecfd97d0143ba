use crate::error::{Error, Result};
use ndarray::Array2;

/// Single-channel image buffer of 32-bit float samples.
///
/// Samples are addressed by `(row, col)` and stored row-major. Values are
/// nominally in `[0, 255]`; thresholds throughout the pipeline are scaled
/// to that range.
#[derive(Debug, Clone, PartialEq)]
pub struct MatF32 {
    data: Vec<f32>,
    rows: usize,
    cols: usize,
}

impl MatF32 {
    /// Create a new zero-filled matrix with the given dimensions
    pub fn new(rows: usize, cols: usize) -> Result<Self> {
        if rows == 0 || cols == 0 {
            return Err(Error::InvalidDimensions(
                "Rows and columns must be greater than 0".to_string(),
            ));
        }

        Ok(Self {
            data: vec![0.0; rows * cols],
            rows,
            cols,
        })
    }

    /// Create a matrix filled with a constant value
    pub fn full(rows: usize, cols: usize, value: f32) -> Result<Self> {
        let mut mat = Self::new(rows, cols)?;
        mat.data.fill(value);
        Ok(mat)
    }

    /// Create a matrix from row-major data
    pub fn from_vec(rows: usize, cols: usize, data: Vec<f32>) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(Error::InvalidDimensions(format!(
                "Data size {} doesn't match expected size {}",
                data.len(),
                rows * cols
            )));
        }
        if rows == 0 || cols == 0 {
            return Err(Error::InvalidDimensions(
                "Rows and columns must be greater than 0".to_string(),
            ));
        }

        Ok(Self { data, rows, cols })
    }

    /// Create a matrix by evaluating `f(row, col)` at every sample
    pub fn from_fn<F>(rows: usize, cols: usize, f: F) -> Result<Self>
    where
        F: Fn(usize, usize) -> f32,
    {
        let mut mat = Self::new(rows, cols)?;
        for row in 0..rows {
            for col in 0..cols {
                mat.data[row * cols + col] = f(row, col);
            }
        }
        Ok(mat)
    }

    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[must_use]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Read the sample at `(row, col)`
    ///
    /// # Panics
    /// Panics when the position lies outside the matrix.
    #[inline]
    #[must_use]
    pub fn at(&self, row: usize, col: usize) -> f32 {
        debug_assert!(row < self.rows && col < self.cols);
        self.data[row * self.cols + col]
    }

    /// Write the sample at `(row, col)`
    ///
    /// # Panics
    /// Panics when the position lies outside the matrix.
    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: f32) {
        debug_assert!(row < self.rows && col < self.cols);
        self.data[row * self.cols + col] = value;
    }

    /// Checked read, `None` outside the matrix
    #[inline]
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> Option<f32> {
        if row < self.rows && col < self.cols {
            Some(self.data[row * self.cols + col])
        } else {
            None
        }
    }

    /// Raw row-major sample slice
    #[must_use]
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Mutable raw row-major sample slice
    pub fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Extract the `rows x cols` window whose top-left corner is
    /// `(row_start, col_start)`
    pub fn window(
        &self,
        row_start: usize,
        col_start: usize,
        rows: usize,
        cols: usize,
    ) -> Result<MatF32> {
        if row_start + rows > self.rows || col_start + cols > self.cols {
            return Err(Error::InvalidDimensions(format!(
                "Window {}x{} at ({}, {}) exceeds matrix {}x{}",
                rows, cols, row_start, col_start, self.rows, self.cols
            )));
        }

        MatF32::from_fn(rows, cols, |row, col| {
            self.at(row_start + row, col_start + col)
        })
    }

    /// Convert to ndarray for easier manipulation
    pub fn to_array2(&self) -> Result<Array2<f32>> {
        Array2::from_shape_vec((self.rows, self.cols), self.data.clone())
            .map_err(|e| Error::InvalidDimensions(e.to_string()))
    }

    /// Create a matrix from ndarray
    pub fn from_array2(arr: Array2<f32>) -> Result<Self> {
        let rows = arr.nrows();
        let cols = arr.ncols();
        Self::from_vec(rows, cols, arr.into_raw_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mat_creation() {
        let mat = MatF32::new(100, 80).unwrap();
        assert_eq!(mat.rows(), 100);
        assert_eq!(mat.cols(), 80);
        assert!(mat.data().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_mat_zero_dims_rejected() {
        assert!(MatF32::new(0, 10).is_err());
        assert!(MatF32::new(10, 0).is_err());
    }

    #[test]
    fn test_mat_at_set() {
        let mut mat = MatF32::new(10, 10).unwrap();
        mat.set(5, 7, 128.0);
        assert_eq!(mat.at(5, 7), 128.0);
        assert_eq!(mat.at(7, 5), 0.0);
    }

    #[test]
    fn test_mat_from_vec_size_mismatch() {
        assert!(MatF32::from_vec(3, 3, vec![0.0; 8]).is_err());
    }

    #[test]
    fn test_mat_get_out_of_bounds() {
        let mat = MatF32::new(4, 4).unwrap();
        assert_eq!(mat.get(3, 3), Some(0.0));
        assert_eq!(mat.get(4, 0), None);
        assert_eq!(mat.get(0, 4), None);
    }

    #[test]
    fn test_mat_window() {
        let mat = MatF32::from_fn(8, 8, |row, col| (row * 8 + col) as f32).unwrap();
        let win = mat.window(2, 3, 4, 4).unwrap();
        assert_eq!(win.rows(), 4);
        assert_eq!(win.cols(), 4);
        assert_eq!(win.at(0, 0), mat.at(2, 3));
        assert_eq!(win.at(3, 3), mat.at(5, 6));

        assert!(mat.window(6, 6, 4, 4).is_err());
    }

    #[test]
    fn test_mat_ndarray_roundtrip() {
        let mat = MatF32::from_fn(5, 7, |row, col| (row + col) as f32).unwrap();
        let arr = mat.to_array2().unwrap();
        assert_eq!(arr[[2, 3]], 5.0);
        let back = MatF32::from_array2(arr).unwrap();
        assert_eq!(back, mat);
    }
}
