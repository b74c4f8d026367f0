use crate::utils::FormError;
use image::codecs::jpeg::JpegEncoder;
use image::{ColorType, RgbImage};
use log::info;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};

/// Writes page rasters back out as a multi-page PDF, one image per page.
pub struct FormAssembler {
    dpi: f32,
    jpeg_quality: u8,
}

impl FormAssembler {
    pub fn new(dpi: f32, jpeg_quality: u8) -> Self {
        FormAssembler { dpi, jpeg_quality }
    }

    /// Build the whole document in memory; nothing is returned unless every
    /// page encoded.
    pub fn assemble(&self, pages: &[RgbImage]) -> Result<Vec<u8>, FormError> {
        if pages.is_empty() {
            return Err(FormError::InvalidInput("No pages to assemble".to_string()));
        }

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let mut kids = Vec::with_capacity(pages.len());
        for (index, image) in pages.iter().enumerate() {
            let page_id = self.add_page(&mut doc, pages_id, image, index + 1)?;
            kids.push(Object::Reference(page_id));
        }

        let page_count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => page_count,
            }),
        );

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc.compress();

        let mut output = Vec::new();
        doc.save_to(&mut output)
            .map_err(|e| FormError::render(pages.len(), format!("Failed to write PDF: {}", e)))?;

        info!("Assembled {} page(s) into {} bytes", pages.len(), output.len());
        Ok(output)
    }

    fn add_page(
        &self,
        doc: &mut Document,
        pages_id: ObjectId,
        image: &RgbImage,
        page: usize,
    ) -> Result<ObjectId, FormError> {
        let (width_px, height_px) = image.dimensions();

        let mut jpeg = Vec::new();
        JpegEncoder::new_with_quality(&mut jpeg, self.jpeg_quality)
            .encode(image.as_raw(), width_px, height_px, ColorType::Rgb8)
            .map_err(|e| FormError::render(page, format!("JPEG encoding failed: {}", e)))?;

        let image_id = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => width_px as i64,
                "Height" => height_px as i64,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
                "Filter" => "DCTDecode",
            },
            jpeg,
        )
        .with_compression(false));

        // Back to points so the page keeps its printed size.
        let (width_pt, height_pt) = self.page_size_points(width_px, height_px);

        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        width_pt.into(),
                        0.into(),
                        0.into(),
                        height_pt.into(),
                        0.into(),
                        0.into(),
                    ],
                ),
                Operation::new("Do", vec!["Im0".into()]),
                Operation::new("Q", vec![]),
            ],
        };
        let content_bytes = content
            .encode()
            .map_err(|e| FormError::render(page, format!("Failed to encode page content: {}", e)))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, content_bytes));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), width_pt.into(), height_pt.into()],
            "Contents" => content_id,
            "Resources" => dictionary! {
                "XObject" => dictionary! {
                    "Im0" => image_id,
                },
            },
        });

        Ok(page_id)
    }

    pub fn page_size_points(&self, width_px: u32, height_px: u32) -> (f32, f32) {
        let scale = 72.0 / self.dpi;
        (width_px as f32 * scale, height_px as f32 * scale)
    }
}
