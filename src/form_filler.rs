use crate::config::FormFillerConfig;
use crate::models::{CanonicalFieldRecord, FieldOccurrence, TextPlacement};
use crate::processing::{
    FieldLocator, FieldMapper, FormAssembler, LabelExtractor, MultilineMerger, OverlayFont,
    OverlayRenderer, PageRasterizer, PdfiumRasterizer, TesseractRecognizer, TextRecognizer,
};
use crate::utils::FormError;
use image::RgbImage;
use log::info;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Result of a fill run.
#[derive(Debug)]
pub struct FillOutcome {
    pub pdf: Vec<u8>,
    pub page_count: usize,
    pub occurrences: Vec<FieldOccurrence>,
    pub placements: Vec<TextPlacement>,
}

pub struct FormFiller {
    config: FormFillerConfig,
    rasterizer: Box<dyn PageRasterizer>,
    recognizer: Box<dyn TextRecognizer>,
    locator: FieldLocator,
    mapper: FieldMapper,
    renderer: OverlayRenderer,
    pool: Option<rayon::ThreadPool>,
}

impl FormFiller {
    pub fn new(
        config: FormFillerConfig,
        rasterizer: Box<dyn PageRasterizer>,
        recognizer: Box<dyn TextRecognizer>,
    ) -> Result<Self, FormError> {
        config.validate()?;

        let pool = match config.max_workers {
            Some(workers) => Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(workers)
                    .build()
                    .map_err(|e| FormError::DependencyUnavailable(format!("Worker pool: {}", e)))?,
            ),
            None => None,
        };

        let renderer = OverlayRenderer::new(&config.font);

        Ok(FormFiller {
            config,
            rasterizer,
            recognizer,
            locator: FieldLocator::standard(),
            mapper: FieldMapper::default(),
            renderer,
            pool,
        })
    }

    /// PDFium for rasterizing, Tesseract for recognition.
    pub fn with_defaults(config: FormFillerConfig) -> Result<Self, FormError> {
        let rasterizer = PdfiumRasterizer::new()?;
        let recognizer = TesseractRecognizer::new(&config.language, config.tessdata_dir.clone(), config.dpi);
        Self::new(config, Box::new(rasterizer), Box::new(recognizer))
    }

    /// Replace the resolved overlay font.
    pub fn with_font(mut self, font: OverlayFont) -> Self {
        self.renderer = OverlayRenderer::with_font(font, &self.config.font);
        self
    }

    fn run<R: Send>(&self, op: impl FnOnce() -> R + Send) -> R {
        match &self.pool {
            Some(pool) => pool.install(op),
            None => op(),
        }
    }

    fn rasterize(&self, pdf: &[u8]) -> Result<Vec<RgbImage>, FormError> {
        // Fail on a missing engine before spending time on rasterization.
        self.recognizer.check_available()?;

        let pages = self.rasterizer.rasterize(pdf, self.config.dpi)?;
        if pages.is_empty() {
            return Err(FormError::InvalidInput("PDF has no pages".to_string()));
        }
        Ok(pages)
    }

    fn find_fields(&self, pages: &[RgbImage]) -> Result<Vec<FieldOccurrence>, FormError> {
        let recognizer: &dyn TextRecognizer = self.recognizer.as_ref();
        let words = self.run(|| LabelExtractor::new(recognizer).extract(pages))?;

        let labels = MultilineMerger::merge_pages(&words);
        let occurrences = self.locator.locate(&labels);
        info!(
            "Located {} marker occurrence(s) among {} label(s)",
            occurrences.len(),
            labels.len()
        );
        Ok(occurrences)
    }

    /// Every marker occurrence in the document.
    pub fn locate(&self, pdf: &[u8]) -> Result<Vec<FieldOccurrence>, FormError> {
        let pages = self.rasterize(pdf)?;
        self.find_fields(&pages)
    }

    /// Run the whole pipeline on an in-memory PDF.
    pub fn fill(&self, pdf: &[u8], record: &CanonicalFieldRecord) -> Result<FillOutcome, FormError> {
        let mut pages = self.rasterize(pdf)?;
        let page_count = pages.len();

        let occurrences = self.find_fields(&pages)?;
        let mapped = self.mapper.map_all(&occurrences);
        let plan = OverlayRenderer::plan(page_count, &mapped, record);

        let renderer = &self.renderer;
        self.run(|| renderer.paint(&mut pages, &plan))?;

        let pdf = FormAssembler::new(self.config.dpi, self.config.jpeg_quality).assemble(&pages)?;

        Ok(FillOutcome {
            pdf,
            page_count,
            occurrences,
            placements: plan.into_iter().flatten().collect(),
        })
    }

    /// Fill `input` and write the result to `output`. The output file only
    /// appears once the complete PDF has been written.
    pub fn fill_file(
        &self,
        input: &Path,
        record: &CanonicalFieldRecord,
        output: &Path,
    ) -> Result<PathBuf, FormError> {
        let pdf = std::fs::read(input).map_err(|e| {
            FormError::InvalidInput(format!("Failed to read {}: {}", input.display(), e))
        })?;

        let outcome = self.fill(&pdf, record)?;
        write_atomically(output, &outcome.pdf)?;

        info!(
            "Filled form saved to {} ({} page(s), {} line(s) drawn)",
            output.display(),
            outcome.page_count,
            outcome.placements.len()
        );
        Ok(output.to_path_buf())
    }
}

fn write_atomically(output: &Path, bytes: &[u8]) -> Result<(), FormError> {
    use std::io::Write;

    let dir = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let mut temp_file = NamedTempFile::new_in(&dir)?;
    temp_file.write_all(bytes)?;
    temp_file.flush()?;
    temp_file.persist(output).map_err(|e| FormError::Io(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RecognizedWord;
    use image::Rgb;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct BlankPages {
        count: usize,
        calls: Arc<AtomicUsize>,
    }

    impl PageRasterizer for BlankPages {
        fn rasterize(&self, _pdf: &[u8], _dpi: f32) -> Result<Vec<RgbImage>, FormError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok((0..self.count)
                .map(|_| RgbImage::from_pixel(600, 400, Rgb([255, 255, 255])))
                .collect())
        }
    }

    struct NoEngine;

    impl TextRecognizer for NoEngine {
        fn check_available(&self) -> Result<(), FormError> {
            Err(FormError::DependencyUnavailable("tesseract missing".into()))
        }

        fn recognize(&self, _image: &RgbImage, _page: usize) -> Result<Vec<RecognizedWord>, FormError> {
            Err(FormError::DependencyUnavailable("tesseract missing".into()))
        }
    }

    struct NoWords;

    impl TextRecognizer for NoWords {
        fn check_available(&self) -> Result<(), FormError> {
            Ok(())
        }

        fn recognize(&self, _image: &RgbImage, _page: usize) -> Result<Vec<RecognizedWord>, FormError> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_missing_engine_stops_before_rasterizing() {
        let calls = Arc::new(AtomicUsize::new(0));
        let filler = FormFiller::new(
            FormFillerConfig::default(),
            Box::new(BlankPages { count: 1, calls: calls.clone() }),
            Box::new(NoEngine),
        )
        .unwrap();

        let result = filler.fill(b"%PDF-1.4", &CanonicalFieldRecord::new());
        assert!(matches!(result, Err(FormError::DependencyUnavailable(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_zero_pages_is_invalid_input() {
        let filler = FormFiller::new(
            FormFillerConfig::default(),
            Box::new(BlankPages { count: 0, calls: Arc::new(AtomicUsize::new(0)) }),
            Box::new(NoWords),
        )
        .unwrap();
        let result = filler.locate(b"%PDF-1.4");
        assert!(matches!(result, Err(FormError::InvalidInput(_))));
    }

    #[test]
    fn test_fill_file_writes_complete_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("form.pdf");
        let output = dir.path().join("filled.pdf");
        std::fs::write(&input, b"%PDF-1.4 placeholder").unwrap();

        let filler = FormFiller::new(
            FormFillerConfig::default(),
            Box::new(BlankPages { count: 2, calls: Arc::new(AtomicUsize::new(0)) }),
            Box::new(NoWords),
        )
        .unwrap()
        .with_font(OverlayFont::Builtin);

        let written = filler.fill_file(&input, &CanonicalFieldRecord::new(), &output).unwrap();
        assert_eq!(written, output);

        let doc = lopdf::Document::load(&output).unwrap();
        assert_eq!(doc.get_pages().len(), 2);
        // Only the final file is left behind.
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 2);
    }

    #[test]
    fn test_unreadable_input_file_is_invalid_input() {
        let filler = FormFiller::new(
            FormFillerConfig::default(),
            Box::new(BlankPages { count: 1, calls: Arc::new(AtomicUsize::new(0)) }),
            Box::new(NoWords),
        )
        .unwrap();
        let dir = tempfile::tempdir().unwrap();
        let result = filler.fill_file(
            &dir.path().join("missing.pdf"),
            &CanonicalFieldRecord::new(),
            &dir.path().join("out.pdf"),
        );
        assert!(matches!(result, Err(FormError::InvalidInput(_))));
        assert!(!dir.path().join("out.pdf").exists());
    }

    #[test]
    fn test_bounded_worker_pool() {
        let config = FormFillerConfig {
            max_workers: Some(2),
            ..FormFillerConfig::default()
        };
        let filler = FormFiller::new(
            config,
            Box::new(BlankPages { count: 5, calls: Arc::new(AtomicUsize::new(0)) }),
            Box::new(NoWords),
        )
        .unwrap()
        .with_font(OverlayFont::Builtin);

        let outcome = filler.fill(b"%PDF-1.4", &CanonicalFieldRecord::new()).unwrap();
        assert_eq!(outcome.page_count, 5);
        assert!(outcome.placements.is_empty());
    }
}
