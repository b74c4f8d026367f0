use crate::models::{BoundingBox, RecognizedWord};
use crate::processing::ImageProcessor;
use crate::utils::FormError;
use image::RgbImage;
use lazy_static::lazy_static;
use log::{debug, info};
use rayon::prelude::*;
use regex::Regex;
use std::path::PathBuf;
use tesseract::{PageSegMode, Tesseract};

lazy_static! {
    // Form labels carry numbering and trailing colons ("1. Name:") that the
    // marker list does not.
    static ref LABEL_NOISE: Regex = Regex::new(r"[0-9:]").unwrap();
}

/// Tesseract TSV row level for individual words.
const WORD_LEVEL: u32 = 5;

/// Word-level text recognition over one page raster.
pub trait TextRecognizer: Send + Sync {
    /// Fails with `DependencyUnavailable` when the engine cannot be started.
    fn check_available(&self) -> Result<(), FormError>;

    /// Recognize words on `image`, tagging each with the 1-based `page`.
    /// Boxes are in the raster's own pixel coordinates.
    fn recognize(&self, image: &RgbImage, page: usize) -> Result<Vec<RecognizedWord>, FormError>;
}

pub struct TesseractRecognizer {
    language: String,
    tessdata_dir: Option<PathBuf>,
    dpi: i32,
}

impl TesseractRecognizer {
    pub fn new(language: &str, tessdata_dir: Option<PathBuf>, dpi: f32) -> Self {
        TesseractRecognizer {
            language: language.to_string(),
            tessdata_dir,
            dpi: dpi.round() as i32,
        }
    }

    /// The tessdata directory as the engine expects it. A path that is not
    /// valid UTF-8 is refused rather than replaced by the default location.
    fn datapath(&self) -> Result<Option<&str>, FormError> {
        match &self.tessdata_dir {
            Some(dir) => dir.to_str().map(Some).ok_or_else(|| {
                FormError::InvalidInput(format!(
                    "Tessdata directory {} is not valid UTF-8",
                    dir.display()
                ))
            }),
            None => Ok(None),
        }
    }

    fn engine(&self) -> Result<Tesseract, FormError> {
        let datapath = self.datapath()?;
        Tesseract::new(datapath, Some(&self.language)).map_err(|e| {
            FormError::DependencyUnavailable(format!(
                "Tesseract could not start with language '{}': {}",
                self.language, e
            ))
        })
    }
}

impl TextRecognizer for TesseractRecognizer {
    fn check_available(&self) -> Result<(), FormError> {
        self.engine().map(|_| ())
    }

    fn recognize(&self, image: &RgbImage, page: usize) -> Result<Vec<RecognizedWord>, FormError> {
        let gray = ImageProcessor::prepare_for_ocr(image);
        let temp_file = ImageProcessor::save_to_temp_file(&gray, page)?;
        let path_str = temp_file.path().to_str().ok_or_else(|| {
            FormError::InvalidInput("Temporary file path is not valid UTF-8".to_string())
        })?;

        let mut tess = self.engine()?;
        tess.set_page_seg_mode(PageSegMode::PsmAuto);

        let tess = tess
            .set_image(path_str)
            .map_err(|e| FormError::InvalidInput(format!("Tesseract could not read page {}: {}", page, e)))?;
        let tess = tess.set_source_resolution(self.dpi);

        let mut tess = tess
            .recognize()
            .map_err(|e| FormError::InvalidInput(format!("Recognition failed on page {}: {}", page, e)))?;
        let tsv = tess
            .get_tsv_text(0)
            .map_err(|e| FormError::InvalidInput(format!("No TSV output for page {}: {}", page, e)))?;

        Ok(parse_tsv_words(&tsv, page))
    }
}

/// Parse Tesseract TSV output into words. Only word-level rows are kept;
/// header rows, rows with unparseable boxes, and rows whose text is empty
/// after [`clean_label_text`] are skipped.
pub fn parse_tsv_words(tsv: &str, page: usize) -> Vec<RecognizedWord> {
    let mut words = Vec::new();

    for (line_no, line) in tsv.lines().enumerate() {
        let columns: Vec<&str> = line.split('\t').collect();
        if columns.len() < 12 {
            continue;
        }

        match columns[0].trim().parse::<u32>() {
            Ok(WORD_LEVEL) => {}
            Ok(_) => continue,
            Err(_) => {
                // Header row or garbage
                debug!("Skipping TSV line {} on page {}: bad level", line_no, page);
                continue;
            }
        }

        let bbox = match parse_box(&columns[6..10]) {
            Some(bbox) => bbox,
            None => {
                debug!("Skipping TSV line {} on page {}: unparseable box", line_no, page);
                continue;
            }
        };

        // Text is the remainder; a tab inside the text would otherwise be lost.
        let raw_text = columns[11..].join("\t");
        let text = clean_label_text(&raw_text);
        if text.trim().is_empty() {
            continue;
        }

        words.push(RecognizedWord::new(text, page, bbox));
    }

    words
}

fn parse_box(columns: &[&str]) -> Option<BoundingBox> {
    let mut values = [0i32; 4];
    for (slot, column) in values.iter_mut().zip(columns) {
        *slot = column.trim().parse().ok()?;
    }
    if values[2] < 0 || values[3] < 0 {
        return None;
    }
    Some(BoundingBox::new(values[0], values[1], values[2], values[3]))
}

/// Strip digits and colons from a recognized word.
pub fn clean_label_text(text: &str) -> String {
    LABEL_NOISE.replace_all(text, "").trim().to_string()
}

/// Runs a recognizer over every page.
pub struct LabelExtractor<'a> {
    recognizer: &'a dyn TextRecognizer,
}

impl<'a> LabelExtractor<'a> {
    pub fn new(recognizer: &'a dyn TextRecognizer) -> Self {
        LabelExtractor { recognizer }
    }

    /// Words per page, in page order. Pages are recognized in parallel on the
    /// current rayon pool.
    pub fn extract(&self, pages: &[RgbImage]) -> Result<Vec<Vec<RecognizedWord>>, FormError> {
        self.recognizer.check_available()?;

        let per_page: Vec<Vec<RecognizedWord>> = pages
            .par_iter()
            .enumerate()
            .map(|(index, image)| {
                let words = self.recognizer.recognize(image, index + 1)?;
                Ok(words
                    .into_iter()
                    .filter(|word| !word.text.trim().is_empty())
                    .collect())
            })
            .collect::<Result<_, FormError>>()?;

        let total: usize = per_page.iter().map(Vec::len).sum();
        info!("Recognized {} word(s) across {} page(s)", total, pages.len());
        Ok(per_page)
    }
}
