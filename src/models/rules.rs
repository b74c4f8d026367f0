use crate::models::CanonicalField;

// Layout constants. The merge thresholds and the draw offset were tuned
// together against 200 DPI rasters; changing one shifts where values land.
pub const MERGE_THRESHOLD_X: i32 = 70;
pub const MERGE_THRESHOLD_Y: i32 = 18;
pub const DRAW_OFFSET_X: i32 = 225;
pub const DRAW_OFFSET_Y: i32 = -10;
pub const ADDRESS_MAX_CHARS: usize = 74;
pub const ADDRESS_WRAP_WIDTH: usize = 40;
pub const LINE_HEIGHT: i32 = 35;
pub const FONT_SIZE: f32 = 30.0;

/// Labels printed on the form that the locator searches for.
pub const SEARCH_MARKERS: [&str; 6] = [
    ".name*",
    ".date of birth*",
    ".gender*",
    "address*",
    ".pan*",
    "mobile no.",
];

#[derive(Debug)]
pub struct FieldMapping {
    pub marker: &'static str,
    pub field: CanonicalField,
    /// Field drawn instead when `field` has no usable value.
    pub fallback: Option<CanonicalField>,
}

/// Ordered marker table. Lookups are first-match-wins in declaration order.
pub struct FieldMarkerTable {
    pub entries: &'static [FieldMapping],
}

static DEFAULT_ENTRIES: [FieldMapping; 8] = [
    FieldMapping {
        marker: ".name*",
        field: CanonicalField::Name,
        fallback: Some(CanonicalField::FirstName),
    },
    FieldMapping {
        marker: ".date of birth*",
        field: CanonicalField::DateOfBirth,
        fallback: None,
    },
    FieldMapping {
        marker: ".pan*",
        field: CanonicalField::PanNumber,
        fallback: None,
    },
    FieldMapping {
        marker: ".gender*",
        field: CanonicalField::Gender,
        fallback: None,
    },
    FieldMapping {
        marker: "address*",
        field: CanonicalField::Address,
        fallback: None,
    },
    FieldMapping {
        marker: "mobile no.",
        field: CanonicalField::PhoneNumber,
        fallback: None,
    },
    FieldMapping {
        marker: "First Name",
        field: CanonicalField::FirstName,
        fallback: None,
    },
    FieldMapping {
        marker: "Last Name",
        field: CanonicalField::LastName,
        fallback: None,
    },
];

impl FieldMarkerTable {
    pub fn standard() -> Self {
        FieldMarkerTable {
            entries: &DEFAULT_ENTRIES,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldMapping> {
        self.entries.iter()
    }
}

impl Default for FieldMarkerTable {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_search_marker_has_a_mapping() {
        let table = FieldMarkerTable::standard();
        for marker in SEARCH_MARKERS {
            assert!(
                table.iter().any(|entry| entry.marker == marker),
                "no mapping for {}",
                marker
            );
        }
    }

    #[test]
    fn test_pan_and_birth_date_keep_their_own_fields() {
        let table = FieldMarkerTable::standard();
        let pan = table.iter().find(|e| e.marker == ".pan*").unwrap();
        let dob = table.iter().find(|e| e.marker == ".date of birth*").unwrap();
        assert_eq!(pan.field, CanonicalField::PanNumber);
        assert_eq!(dob.field, CanonicalField::DateOfBirth);
    }
}
