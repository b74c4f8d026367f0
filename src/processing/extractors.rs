// Field extraction from the free text returned by the external ID reader.
use crate::models::{CanonicalField, CanonicalFieldRecord, NOT_FOUND};
use lazy_static::lazy_static;
use log::debug;
use regex::Regex;

/// Turns whatever the ID reader returned into a field record.
pub trait IdTextParser {
    fn parse(&self, raw_text: &str) -> CanonicalFieldRecord;
}

lazy_static! {
    static ref EMPHASIS: Regex = Regex::new(r"\*+").unwrap();

    static ref NAME_PATTERN: Regex = Regex::new(r"Name:[ \t]*([A-Za-z /]+?)[ \t]*(?:\r?\n|$)").unwrap();
    static ref DOB_PATTERN: Regex = Regex::new(r"Date of Birth:\s*(\d{2}-\d{2}-\d{4})").unwrap();
    static ref PHONE_PATTERN: Regex = Regex::new(r"Phone Number:\s*(\d{10})").unwrap();
    static ref AADHAAR_PATTERN: Regex = Regex::new(r"Aadhaar Number:\s*(\d{4}\s?\d{4}\s?\d{4})").unwrap();
    static ref GENDER_PATTERN: Regex = Regex::new(r"Gender:\s*(MALE|FEMALE|OTHER)").unwrap();
    static ref PAN_PATTERN: Regex = Regex::new(r"PAN Number:[ \t]*(.+)").unwrap();
    static ref VID_PATTERN: Regex = Regex::new(r"VID Number:\s*(\d{16})").unwrap();
    // Address body, then an optional six digit pincode at the end of the line.
    static ref ADDRESS_PATTERN: Regex =
        Regex::new(r"(?m)Address:\s*([\w\s,.\-]+?)(?:\s*(\d{6}))?[ \t]*$").unwrap();
}

/// Parser for "Label: value" lines, one field per line.
pub struct LabeledTextParser;

impl LabeledTextParser {
    fn capture(pattern: &Regex, text: &str) -> Option<String> {
        pattern
            .captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim().to_uppercase())
            .filter(|value| !value.is_empty())
    }

    pub fn extract_address_from_text(text: &str) -> Option<String> {
        let caps = ADDRESS_PATTERN.captures(text)?;
        let body = caps.get(1)?.as_str().trim().to_uppercase();
        let address = match caps.get(2) {
            Some(pincode) => format!("{} {}", body, pincode.as_str()).trim().to_string(),
            None => body,
        };
        if address.is_empty() {
            None
        } else {
            Some(address)
        }
    }

    /// Split a full name into (first, last). The last token is the last
    /// name; a single token leaves the last name empty.
    pub fn split_name(name: &str) -> (String, String) {
        let parts: Vec<&str> = name.split_whitespace().collect();
        match parts.split_last() {
            Some((last, rest)) if !rest.is_empty() => (rest.join(" "), last.to_string()),
            Some((only, _)) => (only.to_string(), String::new()),
            None => (String::new(), String::new()),
        }
    }
}

impl IdTextParser for LabeledTextParser {
    fn parse(&self, raw_text: &str) -> CanonicalFieldRecord {
        let text = EMPHASIS.replace_all(raw_text, "");
        let mut record = CanonicalFieldRecord::new();

        let simple_fields: [(CanonicalField, &Regex); 7] = [
            (CanonicalField::Name, &*NAME_PATTERN),
            (CanonicalField::DateOfBirth, &*DOB_PATTERN),
            (CanonicalField::PhoneNumber, &*PHONE_PATTERN),
            (CanonicalField::AadhaarNumber, &*AADHAAR_PATTERN),
            (CanonicalField::Gender, &*GENDER_PATTERN),
            (CanonicalField::PanNumber, &*PAN_PATTERN),
            (CanonicalField::VidNumber, &*VID_PATTERN),
        ];

        for (field, pattern) in simple_fields {
            let value = Self::capture(pattern, &text).unwrap_or_else(|| NOT_FOUND.to_string());
            record.set(field, value);
        }

        let address = Self::extract_address_from_text(&text).unwrap_or_else(|| NOT_FOUND.to_string());
        record.set(CanonicalField::Address, address);

        match record.get(CanonicalField::Name).map(Self::split_name) {
            Some((first, last)) => {
                record.set(CanonicalField::FirstName, first);
                record.set(CanonicalField::LastName, last);
            }
            None => {
                record.set(CanonicalField::FirstName, NOT_FOUND);
                record.set(CanonicalField::LastName, NOT_FOUND);
            }
        }

        let found = record.iter().filter(|(_, v)| *v != NOT_FOUND).count();
        debug!("Parsed {} of {} fields from ID reader text", found, record.len());
        record
    }
}
