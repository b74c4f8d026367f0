pub mod data;
pub mod record;
pub mod rules;

pub use data::*;
pub use record::{CanonicalField, CanonicalFieldRecord, NOT_FOUND};
pub use rules::{FieldMapping, FieldMarkerTable, SEARCH_MARKERS};
