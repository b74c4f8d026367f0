pub mod config;
pub mod form_filler;
pub mod models;
pub mod processing;
pub mod utils;
pub mod validation;

pub use config::{FontConfig, FormFillerConfig};
pub use form_filler::{FillOutcome, FormFiller};
pub use utils::FormError;
