use crate::models::{FieldOccurrence, MergedLabel, SEARCH_MARKERS};
use log::debug;

pub struct FieldLocator {
    markers: Vec<String>,
}

/// Lower-cased, trimmed form used for every marker comparison.
pub fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

impl FieldLocator {
    pub fn new<I, S>(markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        FieldLocator {
            markers: markers.into_iter().map(|m| normalize(m.as_ref())).collect(),
        }
    }

    pub fn standard() -> Self {
        Self::new(SEARCH_MARKERS)
    }

    /// One occurrence per label whose normalized text equals a marker.
    /// Every occurrence on every page is kept, in label order.
    pub fn locate(&self, labels: &[MergedLabel]) -> Vec<FieldOccurrence> {
        let mut occurrences = Vec::new();

        for label in labels {
            let text = normalize(&label.text);
            if let Some(marker) = self.markers.iter().find(|m| **m == text) {
                debug!(
                    "Marker '{}' on page {} at ({}, {})",
                    marker, label.page, label.bbox.x, label.bbox.y
                );
                occurrences.push(FieldOccurrence {
                    field_marker: marker.clone(),
                    page: label.page,
                    bbox: label.bbox,
                });
            }
        }

        occurrences
    }
}

impl Default for FieldLocator {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BoundingBox;

    fn label(text: &str, page: usize, x: i32, y: i32) -> MergedLabel {
        MergedLabel {
            text: text.to_string(),
            page,
            bbox: BoundingBox::new(x, y, 50, 20),
        }
    }

    #[test]
    fn test_match_ignores_case_and_padding() {
        let locator = FieldLocator::standard();
        let labels = vec![
            label("  .NAME*  ", 1, 100, 200),
            label("Mobile No.", 1, 100, 300),
            label(".Date Of Birth*", 2, 80, 120),
        ];
        let found = locator.locate(&labels);
        let markers: Vec<&str> = found.iter().map(|o| o.field_marker.as_str()).collect();
        assert_eq!(markers, vec![".name*", "mobile no.", ".date of birth*"]);
        assert_eq!(found[2].page, 2);
    }

    #[test]
    fn test_exact_match_only() {
        let locator = FieldLocator::standard();
        let labels = vec![label(".name* of applicant", 1, 0, 0), label("name", 1, 0, 40)];
        assert!(locator.locate(&labels).is_empty());
    }

    #[test]
    fn test_all_occurrences_are_kept() {
        let locator = FieldLocator::standard();
        let labels = vec![
            label(".name*", 1, 100, 200),
            label(".name*", 1, 100, 900),
            label(".name*", 3, 100, 200),
        ];
        let found = locator.locate(&labels);
        assert_eq!(found.len(), 3);
        assert_eq!(found[1].bbox.y, 900);
        assert_eq!(found[2].page, 3);
    }

    #[test]
    fn test_custom_markers_are_normalized() {
        let locator = FieldLocator::new(["  Aadhaar No. "]);
        let found = locator.locate(&[label("AADHAAR NO.", 1, 0, 0)]);
        assert_eq!(found.len(), 1);
    }
}
