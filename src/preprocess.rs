use std::io::Cursor;

use image::imageops::FilterType;
use image::io::Reader as ImageReader;
use ndarray::Array4;

use crate::error::ApiError;

/// Edge length the trained model expects.
pub const IMAGE_SIZE: u32 = 224;

/// Decode an uploaded byte buffer into the model's input tensor.
///
/// The pipeline is fixed by the trained artifact: decode to RGB (alpha
/// and palette information is dropped), resize to exactly 224x224, scale
/// channel values into [0, 1], and add a batch dimension. The layout is
/// NHWC, 1x224x224x3.
pub fn image_to_tensor(bytes: &[u8]) -> Result<Array4<f32>, ApiError> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| ApiError::InvalidImage(e.to_string()))?;
    let img = reader
        .decode()
        .map_err(|e| ApiError::InvalidImage(e.to_string()))?;

    let resized = img
        .resize_exact(IMAGE_SIZE, IMAGE_SIZE, FilterType::Triangle)
        .to_rgb8();

    let size = IMAGE_SIZE as usize;
    let mut tensor = Array4::zeros((1, size, size, 3));
    for (x, y, pixel) in resized.enumerate_pixels() {
        for c in 0..3 {
            tensor[[0, y as usize, x as usize, c]] = f32::from(pixel[c]) / 255.0;
        }
    }
    Ok(tensor)
}
