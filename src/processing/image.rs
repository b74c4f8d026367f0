use crate::utils::FormError;
use image::{GrayImage, ImageOutputFormat, RgbImage};
use std::io::{Cursor, Write};
use tempfile::NamedTempFile;

pub struct ImageProcessor;

impl ImageProcessor {
    /// Grayscale copy of a page raster for recognition. Geometry is left
    /// untouched so recognized boxes stay valid on the color raster.
    pub fn prepare_for_ocr(page: &RgbImage) -> GrayImage {
        image::imageops::grayscale(page)
    }

    pub fn encode_png(image: &GrayImage, page: usize) -> Result<Vec<u8>, FormError> {
        let mut buffer = Cursor::new(Vec::new());
        image
            .write_to(&mut buffer, ImageOutputFormat::Png)
            .map_err(|e| FormError::render(page, format!("PNG encoding failed: {}", e)))?;
        Ok(buffer.into_inner())
    }

    /// Write the page to a temporary PNG. The file is removed when the
    /// returned handle is dropped.
    pub fn save_to_temp_file(image: &GrayImage, page: usize) -> Result<NamedTempFile, FormError> {
        let png = Self::encode_png(image, page)?;

        let mut temp_file = tempfile::Builder::new()
            .prefix("formfill-page-")
            .suffix(".png")
            .tempfile()?;
        temp_file.write_all(&png)?;
        temp_file.flush()?;

        Ok(temp_file)
    }
}
