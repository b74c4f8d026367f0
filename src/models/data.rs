use serde::{Deserialize, Serialize};

/// Axis-aligned box in raster pixel coordinates, origin at the top-left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl BoundingBox {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        BoundingBox {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> i32 {
        self.x + self.width
    }
}

/// One word as produced by the recognizer. Pages are 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognizedWord {
    pub text: String,
    pub page: usize,
    pub bbox: BoundingBox,
}

impl RecognizedWord {
    pub fn new(text: impl Into<String>, page: usize, bbox: BoundingBox) -> Self {
        RecognizedWord {
            text: text.into(),
            page,
            bbox,
        }
    }
}

/// One or more recognized words coalesced into a logical label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedLabel {
    pub text: String,
    pub page: usize,
    pub bbox: BoundingBox,
}

/// A page position where a known marker label was found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldOccurrence {
    pub field_marker: String,
    pub page: usize,
    pub bbox: BoundingBox,
}

/// A single planned draw call on a page raster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextPlacement {
    pub page: usize,
    pub x: i32,
    pub y: i32,
    pub text: String,
    pub field: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssueType {
    Missing,
    Format,
}

#[derive(Debug, Clone)]
pub struct ValidationIssue {
    pub issue_type: ValidationIssueType,
    pub field: String,
    pub message: String,
}

#[derive(Debug)]
pub struct RecordValidation {
    pub is_valid: bool,
    pub fields_present: usize,
    pub issues: Vec<ValidationIssue>,
}
