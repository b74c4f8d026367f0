use crate::models::{FieldMapping, FieldMarkerTable, FieldOccurrence};
use crate::processing::locator::normalize;

/// An occurrence with the table entry it resolved to.
#[derive(Debug, Clone)]
pub struct MappedOccurrence<'t> {
    pub occurrence: FieldOccurrence,
    pub mapping: &'t FieldMapping,
}

pub struct FieldMapper {
    table: FieldMarkerTable,
}

impl FieldMapper {
    pub fn new(table: FieldMarkerTable) -> Self {
        FieldMapper { table }
    }

    /// First table entry, in declaration order, whose marker is a substring
    /// of `marker_text`. Both sides are compared lower-cased and trimmed, so
    /// recognition noise around a marker ("mobile no.:") still resolves.
    pub fn lookup(&self, marker_text: &str) -> Option<&FieldMapping> {
        let text = normalize(marker_text);
        self.table
            .iter()
            .find(|entry| text.contains(&normalize(entry.marker)))
    }

    /// Attach mappings; occurrences nothing maps to are dropped.
    pub fn map_all(&self, occurrences: &[FieldOccurrence]) -> Vec<MappedOccurrence<'_>> {
        occurrences
            .iter()
            .filter_map(|occurrence| {
                self.lookup(&occurrence.field_marker).map(|mapping| MappedOccurrence {
                    occurrence: occurrence.clone(),
                    mapping,
                })
            })
            .collect()
    }
}

impl Default for FieldMapper {
    fn default() -> Self {
        Self::new(FieldMarkerTable::standard())
    }
}
