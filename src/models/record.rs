use crate::utils::FormError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

/// Value stored for a field the ID reader could not find.
pub const NOT_FOUND: &str = "NOT FOUND";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CanonicalField {
    Name,
    FirstName,
    LastName,
    DateOfBirth,
    PhoneNumber,
    AadhaarNumber,
    Gender,
    PanNumber,
    VidNumber,
    Address,
}

impl CanonicalField {
    pub const ALL: [CanonicalField; 10] = [
        CanonicalField::Name,
        CanonicalField::FirstName,
        CanonicalField::LastName,
        CanonicalField::DateOfBirth,
        CanonicalField::PhoneNumber,
        CanonicalField::AadhaarNumber,
        CanonicalField::Gender,
        CanonicalField::PanNumber,
        CanonicalField::VidNumber,
        CanonicalField::Address,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CanonicalField::Name => "Name",
            CanonicalField::FirstName => "First Name",
            CanonicalField::LastName => "Last Name",
            CanonicalField::DateOfBirth => "Date of Birth",
            CanonicalField::PhoneNumber => "Phone Number",
            CanonicalField::AadhaarNumber => "Aadhaar Number",
            CanonicalField::Gender => "Gender",
            CanonicalField::PanNumber => "PAN Number",
            CanonicalField::VidNumber => "VID Number",
            CanonicalField::Address => "Address",
        }
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical field name to value, as produced by the ID reader and corrected
/// by the user. Keys the pipeline does not know about are kept as-is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalFieldRecord {
    fields: BTreeMap<String, String>,
}

impl CanonicalFieldRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record with every canonical field set to [`NOT_FOUND`].
    pub fn all_not_found() -> Self {
        let mut record = Self::new();
        for field in CanonicalField::ALL {
            record.set(field, NOT_FOUND);
        }
        record
    }

    pub fn set(&mut self, field: CanonicalField, value: impl Into<String>) {
        self.fields.insert(field.as_str().to_string(), value.into());
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(name.into(), value.into());
    }

    /// Raw stored value, sentinel included.
    pub fn raw(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Usable value: present and not the sentinel.
    pub fn value(&self, name: &str) -> Option<&str> {
        self.raw(name).filter(|value| *value != NOT_FOUND)
    }

    pub fn get(&self, field: CanonicalField) -> Option<&str> {
        self.value(field.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Fold another reading into this one. Slots that are absent or hold the
    /// sentinel take the other record's value; filled slots are kept.
    pub fn absorb(&mut self, other: &CanonicalFieldRecord) {
        for (key, value) in &other.fields {
            let replace = match self.fields.get(key) {
                None => true,
                Some(existing) => existing == NOT_FOUND,
            };
            if replace {
                self.fields.insert(key.clone(), value.clone());
            }
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, FormError> {
        let parsed: serde_json::Value = serde_json::from_str(json)
            .map_err(|e| FormError::InvalidInput(format!("Field record is not valid JSON: {}", e)))?;

        let object = parsed.as_object().ok_or_else(|| {
            FormError::InvalidInput("Field record must be a JSON object".to_string())
        })?;

        let mut record = Self::new();
        for (key, value) in object {
            let text = value.as_str().ok_or_else(|| {
                FormError::InvalidInput(format!("Value for '{}' is not a string", key))
            })?;
            record.insert(key.clone(), text);
        }
        Ok(record)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, FormError> {
        let json = std::fs::read_to_string(&path).map_err(|e| {
            FormError::InvalidInput(format!(
                "Failed to read field record {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::from_json_str(&json)
    }

    pub fn to_json_string(&self) -> Result<String, FormError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| FormError::InvalidInput(format!("Failed to serialize field record: {}", e)))
    }
}
