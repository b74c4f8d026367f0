pub mod assembler;
pub mod extractors;
pub mod font;
pub mod image;
pub mod locator;
pub mod mapper;
pub mod merge;
pub mod ocr;
pub mod overlay;
pub mod pdf;

pub use assembler::FormAssembler;
pub use extractors::{IdTextParser, LabeledTextParser};
pub use font::OverlayFont;
pub use self::image::ImageProcessor;
pub use locator::FieldLocator;
pub use mapper::{FieldMapper, MappedOccurrence};
pub use merge::MultilineMerger;
pub use ocr::{LabelExtractor, TesseractRecognizer, TextRecognizer};
pub use overlay::OverlayRenderer;
pub use pdf::{PageRasterizer, PdfiumRasterizer};
