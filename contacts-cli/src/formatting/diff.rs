//! Minimal per-record updates
//!
//! Compares a record's stored values against their canonical and derived
//! forms and keeps only the fields that differ. Running the engine on its
//! own output yields no update.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use super::canonical::{format_phone, is_usa_phone, phone_text, title_case};
use crate::api::models::{
    DUPLICATE_STATUS, FIRST_NAME, FieldValue, IS_USA_NUMBER, LAST_NAME, PHONE, Record,
    RecordUpdate, is_derived_field,
};

/// Status strings written to the duplicate status field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusMarkers {
    /// Template for rows whose signature occurs more than once; `{count}` is
    /// replaced with the occurrence count
    pub duplicate: String,
    pub unique: String,
}

impl Default for StatusMarkers {
    fn default() -> Self {
        Self {
            duplicate: "Duplicate ({count})".to_string(),
            unique: "Unique".to_string(),
        }
    }
}

impl StatusMarkers {
    pub fn status_for(&self, occurrences: usize) -> String {
        if occurrences > 1 {
            self.duplicate.replace("{count}", &occurrences.to_string())
        } else {
            self.unique.clone()
        }
    }
}

/// Canonical phone for a record, if it has one
enum PhoneState {
    Absent,
    Formatted(String),
    /// Formatting failed; the raw text is kept for classification
    Unformattable(Option<String>),
}

impl PhoneState {
    fn of(record: &Record) -> Self {
        let Some(raw) = record.read_field(PHONE) else {
            return PhoneState::Absent;
        };
        if raw.as_str().is_some_and(|s| s.trim().is_empty()) {
            return PhoneState::Absent;
        }

        match format_phone(raw) {
            Ok(formatted) => PhoneState::Formatted(formatted),
            Err(err) => {
                log::warn!("Record {}: skipping phone update, {}", record.id, err);
                PhoneState::Unformattable(phone_text(raw))
            }
        }
    }

    fn text(&self) -> Option<&str> {
        match self {
            PhoneState::Absent => None,
            PhoneState::Formatted(formatted) => Some(formatted.as_str()),
            PhoneState::Unformattable(raw) => raw.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DiffEngine {
    markers: StatusMarkers,
}

impl DiffEngine {
    pub fn new(markers: StatusMarkers) -> Self {
        Self { markers }
    }

    pub fn markers(&self) -> &StatusMarkers {
        &self.markers
    }

    /// The record's field map as it will look once formatted, without the
    /// derived fields
    ///
    /// Signatures are taken over this projection so rows that only differ in
    /// raw formatting are grouped on the first run already.
    pub fn canonical_fields(&self, record: &Record) -> HashMap<String, FieldValue> {
        let mut fields: HashMap<String, FieldValue> = record
            .values
            .iter()
            .filter(|(name, _)| !is_derived_field(name))
            .map(|(name, value)| (name.clone(), FieldValue::Bare(value.value().clone())))
            .collect();

        for name_field in [FIRST_NAME, LAST_NAME] {
            if let Some(name) = record.read_str(name_field) {
                fields.insert(name_field.to_string(), FieldValue::Bare(title_case(name).into()));
            }
        }

        if let Some(Ok(formatted)) = record.read_field(PHONE).map(format_phone) {
            fields.insert(PHONE.to_string(), FieldValue::Bare(formatted.into()));
        }

        fields
    }

    /// Compute the fields of `record` that need to change
    ///
    /// `occurrences` is how often the record's signature appears in the
    /// current batch. Returns `None` when the record is already canonical.
    pub fn diff(&self, record: &Record, signature: &str, occurrences: usize) -> Option<RecordUpdate> {
        let mut update = RecordUpdate::new(record.id.clone());

        for name_field in [FIRST_NAME, LAST_NAME] {
            if let Some(current) = record.read_str(name_field) {
                let cased = title_case(current);
                if cased != current {
                    update.set(name_field, cased);
                }
            }
        }

        let phone = PhoneState::of(record);
        if let PhoneState::Formatted(formatted) = &phone {
            let current = record.read_field(PHONE).and_then(phone_text);
            if current.as_deref() != Some(formatted.as_str()) {
                update.set(PHONE, formatted.clone());
            }
        }

        let is_usa = phone.text().is_some_and(is_usa_phone);
        if record.read_bool(IS_USA_NUMBER) != Some(is_usa) {
            update.set(IS_USA_NUMBER, is_usa);
        }

        let status = self.markers.status_for(occurrences);
        if record.read_str(DUPLICATE_STATUS) != Some(status.as_str()) {
            update.set(DUPLICATE_STATUS, Value::String(status));
        }

        if update.is_empty() {
            return None;
        }

        log::trace!(
            "Record {} (signature '{}'): {} field(s) changed",
            record.id,
            signature,
            update.len()
        );
        Some(update)
    }
}
