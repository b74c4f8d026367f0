use crate::models::{
    CanonicalField, CanonicalFieldRecord, RecordValidation, ValidationIssue, ValidationIssueType,
};
use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref PHONE: Regex = Regex::new(r"^\d{10}$").unwrap();
    static ref AADHAAR: Regex = Regex::new(r"^\d{4}\s?\d{4}\s?\d{4}$").unwrap();
    static ref PAN: Regex = Regex::new(r"^[A-Z]{5}\d{4}[A-Z]$").unwrap();
    static ref VID: Regex = Regex::new(r"^\d{16}$").unwrap();
}

const GENDERS: [&str; 3] = ["MALE", "FEMALE", "OTHER"];

/// Checks a field record before it is shown to the user for correction.
/// Issues are advisory; filling never depends on them.
pub struct RecordValidator;

impl RecordValidator {
    pub fn validate(record: &CanonicalFieldRecord) -> RecordValidation {
        let mut issues = Vec::new();
        let mut fields_present = 0;

        for field in CanonicalField::ALL {
            let Some(value) = record.get(field) else {
                issues.push(ValidationIssue {
                    issue_type: ValidationIssueType::Missing,
                    field: field.as_str().to_string(),
                    message: format!("{} was not found", field),
                });
                continue;
            };
            fields_present += 1;

            if let Some(message) = Self::check_format(field, value.trim()) {
                issues.push(ValidationIssue {
                    issue_type: ValidationIssueType::Format,
                    field: field.as_str().to_string(),
                    message,
                });
            }
        }

        let is_valid = !issues
            .iter()
            .any(|issue| issue.issue_type == ValidationIssueType::Format);

        RecordValidation {
            is_valid,
            fields_present,
            issues,
        }
    }

    fn check_format(field: CanonicalField, value: &str) -> Option<String> {
        match field {
            CanonicalField::DateOfBirth => NaiveDate::parse_from_str(value, "%d-%m-%Y")
                .err()
                .map(|_| format!("Date of birth '{}' is not a valid DD-MM-YYYY date", value)),
            CanonicalField::PhoneNumber if !PHONE.is_match(value) => {
                Some(format!("Phone number '{}' should have 10 digits", value))
            }
            CanonicalField::AadhaarNumber if !AADHAAR.is_match(value) => {
                Some(format!("Aadhaar number '{}' should have 12 digits", value))
            }
            CanonicalField::PanNumber if !PAN.is_match(value) => {
                Some(format!("PAN '{}' should look like ABCDE1234F", value))
            }
            CanonicalField::VidNumber if !VID.is_match(value) => {
                Some(format!("VID '{}' should have 16 digits", value))
            }
            CanonicalField::Gender if !GENDERS.contains(&value) => {
                Some(format!("Gender '{}' should be one of MALE, FEMALE, OTHER", value))
            }
            _ => None,
        }
    }
}
