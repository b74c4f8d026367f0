use crate::models::rules::FONT_SIZE;
use crate::utils::FormError;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Runtime settings for a fill run. The layout constants in
/// `models::rules` are fixed and deliberately not part of this struct.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FormFillerConfig {
    /// Rasterization DPI, shared by recognition and drawing.
    pub dpi: f32,
    /// Tesseract language code.
    pub language: String,
    /// Directory holding `tessdata`; falls back to `TESSDATA_PREFIX`.
    pub tessdata_dir: Option<PathBuf>,
    pub font: FontConfig,
    /// Upper bound on page worker threads. `None` uses one per core.
    pub max_workers: Option<usize>,
    pub jpeg_quality: u8,
}

impl Default for FormFillerConfig {
    fn default() -> Self {
        FormFillerConfig {
            dpi: 200.0,
            language: "eng".to_string(),
            tessdata_dir: None,
            font: FontConfig::default(),
            max_workers: None,
            jpeg_quality: 95,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FontConfig {
    /// Preferred bold TrueType font.
    pub path: Option<PathBuf>,
    pub size: f32,
    pub color: [u8; 3],
}

impl Default for FontConfig {
    fn default() -> Self {
        FontConfig {
            path: None,
            size: FONT_SIZE,
            color: [0, 0, 255],
        }
    }
}

impl FormFillerConfig {
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, FormError> {
        let content = std::fs::read_to_string(&path).map_err(|e| {
            FormError::InvalidInput(format!(
                "Failed to read config {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        let config: FormFillerConfig = serde_json::from_str(&content)
            .map_err(|e| FormError::InvalidInput(format!("Invalid config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), FormError> {
        if !(72.0..=600.0).contains(&self.dpi) {
            return Err(FormError::InvalidInput(format!(
                "DPI {} is outside the supported range 72-600",
                self.dpi
            )));
        }
        if self.font.size <= 0.0 {
            return Err(FormError::InvalidInput("Font size must be positive".to_string()));
        }
        if self.jpeg_quality == 0 || self.jpeg_quality > 100 {
            return Err(FormError::InvalidInput("JPEG quality must be within 1-100".to_string()));
        }
        if self.max_workers == Some(0) {
            return Err(FormError::InvalidInput("max_workers must be at least 1".to_string()));
        }
        Ok(())
    }
}
