//! Conversions between [`HipsImage`] and `ndarray` arrays.

use alloc::vec::Vec;

use ndarray::Array3;

use crate::error::{Error, Result};
use crate::image::HipsImage;

impl HipsImage {
    /// The cube as an `Array3` of shape `(rows, cols, bands)`.
    pub fn to_array3(&self) -> Result<Array3<f32>> {
        Array3::from_shape_vec(self.shape(), self.as_slice().to_vec()).map_err(|_| {
            Error::InvalidShape {
                bands: self.bands() as i64,
                res_x: self.cols() as i64,
                res_y: self.rows() as i64,
            }
        })
    }

    /// Builds an image from an array of shape `(rows, cols, bands)`.
    ///
    /// Works for any memory layout; samples are copied in logical order.
    pub fn from_array3(array: &Array3<f32>) -> Result<Self> {
        let (rows, cols, bands) = array.dim();
        let data: Vec<f32> = array.iter().copied().collect();
        HipsImage::from_vec(rows, cols, bands, data)
    }
}
