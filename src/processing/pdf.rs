//! Rasterizes PDF pages into RGB images.

use crate::utils::FormError;
use image::RgbImage;
use log::{debug, info};
use pdfium_render::prelude::*;

/// Longest raster edge we will produce. Larger pages are refused, not scaled.
const MAX_DIMENSION: u32 = 6000;

/// Renders every page of a PDF at a fixed DPI, in page order.
pub trait PageRasterizer {
    fn rasterize(&self, pdf: &[u8], dpi: f32) -> Result<Vec<RgbImage>, FormError>;
}

/// PDFium-backed rasterizer.
pub struct PdfiumRasterizer {
    pdfium: Pdfium,
}

impl PdfiumRasterizer {
    /// Bind to a PDFium shared library from the working directory, the usual
    /// library prefixes, or the system loader path.
    pub fn new() -> Result<Self, FormError> {
        let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("/usr/lib")))
            .or_else(|_| {
                Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("/usr/local/lib"))
            })
            .or_else(|_| {
                Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("/opt/homebrew/lib"))
            })
            .or_else(|_| Pdfium::bind_to_system_library())
            .map_err(|e| FormError::DependencyUnavailable(format!("Could not load PDFium: {}", e)))?;

        Ok(PdfiumRasterizer {
            pdfium: Pdfium::new(bindings),
        })
    }

    fn render_page(&self, page: &PdfPage, page_number: usize, dpi: f32) -> Result<RgbImage, FormError> {
        let (width_px, height_px) = target_size(page.width().value, page.height().value, dpi)
            .ok_or_else(|| {
                FormError::InvalidInput(format!(
                    "Page {} ({}x{}pt) exceeds {}px at {} DPI",
                    page_number,
                    page.width().value,
                    page.height().value,
                    MAX_DIMENSION,
                    dpi
                ))
            })?;

        let render_config = PdfRenderConfig::new()
            .set_target_width(width_px as i32)
            .set_target_height(height_px as i32)
            .render_form_data(true)
            .render_annotations(true);

        let bitmap = page
            .render_with_config(&render_config)
            .map_err(|e| FormError::InvalidInput(format!("Failed to rasterize page {}: {}", page_number, e)))?;

        let width = bitmap.width() as u32;
        let height = bitmap.height() as u32;
        let rgba = bitmap.as_rgba_bytes();

        rgba_to_rgb(width, height, &rgba).ok_or_else(|| {
            FormError::InvalidInput(format!(
                "Page {} produced a {}x{} bitmap with {} bytes",
                page_number,
                width,
                height,
                rgba.len()
            ))
        })
    }
}

impl PageRasterizer for PdfiumRasterizer {
    fn rasterize(&self, pdf: &[u8], dpi: f32) -> Result<Vec<RgbImage>, FormError> {
        if !is_pdf_bytes(pdf) {
            return Err(FormError::InvalidInput("Input is not a PDF document".to_string()));
        }

        let document = self
            .pdfium
            .load_pdf_from_byte_slice(pdf, None)
            .map_err(|e| FormError::InvalidInput(format!("Failed to load PDF: {}", e)))?;

        let page_count = document.pages().len() as usize;
        if page_count == 0 {
            return Err(FormError::InvalidInput("PDF has no pages".to_string()));
        }
        info!("Rasterizing {} page(s) at {} DPI", page_count, dpi);

        let mut images = Vec::with_capacity(page_count);
        for (index, page) in document.pages().iter().enumerate() {
            let image = self.render_page(&page, index + 1, dpi)?;
            debug!("Page {} rendered at {}x{}", index + 1, image.width(), image.height());
            images.push(image);
        }

        Ok(images)
    }
}

/// Pixel size of a page given in points, or `None` when either edge would
/// exceed [`MAX_DIMENSION`].
pub fn target_size(width_points: f32, height_points: f32, dpi: f32) -> Option<(u32, u32)> {
    let scale = dpi / 72.0;
    let width_px = (width_points * scale).round().max(1.0) as u32;
    let height_px = (height_points * scale).round().max(1.0) as u32;

    if width_px.max(height_px) > MAX_DIMENSION {
        return None;
    }
    Some((width_px, height_px))
}

fn rgba_to_rgb(width: u32, height: u32, rgba: &[u8]) -> Option<RgbImage> {
    if rgba.len() != (width as usize) * (height as usize) * 4 {
        return None;
    }
    let rgb: Vec<u8> = rgba
        .chunks_exact(4)
        .flat_map(|px| [px[0], px[1], px[2]])
        .collect();
    RgbImage::from_raw(width, height, rgb)
}

/// Magic-byte check (`%PDF`).
pub fn is_pdf_bytes(bytes: &[u8]) -> bool {
    bytes.len() >= 4 && &bytes[0..4] == b"%PDF"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::FormAssembler;

    #[test]
    fn test_a4_at_200_dpi() {
        assert_eq!(target_size(595.0, 842.0, 200.0), Some((1653, 2339)));
    }

    #[test]
    fn test_oversized_page_is_refused() {
        // A2 at 300 DPI would need 4961x7017 pixels.
        assert_eq!(target_size(1191.0, 1684.0, 300.0), None);
        assert_eq!(target_size(5000.0, 2500.0, 300.0), None);
    }

    #[test]
    fn test_largest_accepted_page_keeps_its_point_size() {
        // A3 at 300 DPI fits, and the assembled page comes back at A3.
        let (w, h) = target_size(842.0, 1191.0, 300.0).unwrap();
        assert!(w.max(h) <= MAX_DIMENSION);

        let (w_pt, h_pt) = FormAssembler::new(300.0, 90).page_size_points(w, h);
        assert!((w_pt - 842.0).abs() < 0.5);
        assert!((h_pt - 1191.0).abs() < 0.5);
    }

    #[test]
    fn test_rgba_conversion_drops_alpha() {
        let rgba = [10, 20, 30, 255, 40, 50, 60, 0];
        let image = rgba_to_rgb(2, 1, &rgba).unwrap();
        assert_eq!(image.get_pixel(1, 0).0, [40, 50, 60]);
        assert!(rgba_to_rgb(3, 1, &rgba).is_none());
    }

    #[test]
    fn test_pdf_magic() {
        assert!(is_pdf_bytes(b"%PDF-1.7\n"));
        assert!(!is_pdf_bytes(b"PK\x03\x04"));
        assert!(!is_pdf_bytes(b""));
    }
}
