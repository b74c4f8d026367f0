use thiserror::Error;

#[derive(Debug, Error)]
pub enum FormError {
    /// Unreadable or empty PDF, malformed field record, unreadable input file.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// PDFium or Tesseract could not be loaded or initialized.
    #[error("Dependency unavailable: {0}")]
    DependencyUnavailable(String),

    #[error("Render failure on page {page}: {message}")]
    RenderFailure { page: usize, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl FormError {
    pub fn render(page: usize, message: impl Into<String>) -> Self {
        FormError::RenderFailure {
            page,
            message: message.into(),
        }
    }

    /// Process exit code used by the command line front end.
    pub fn exit_code(&self) -> i32 {
        match self {
            FormError::InvalidInput(_) => 2,
            FormError::DependencyUnavailable(_) => 3,
            FormError::RenderFailure { .. } => 4,
            FormError::Io(_) => 1,
        }
    }
}
