//! Contact record types shared by the store clients and the formatting pipeline

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};

pub const FIRST_NAME: &str = "firstName";
pub const LAST_NAME: &str = "lastName";
pub const EMAIL: &str = "email";
pub const PHONE: &str = "phone";
pub const IS_USA_NUMBER: &str = "isUSANumber";
pub const DUPLICATE_STATUS: &str = "duplicateStatus";

/// Fields whose values are written by the pipeline itself
pub const DERIVED_FIELDS: &[&str] = &[IS_USA_NUMBER, DUPLICATE_STATUS];

/// Check whether a field is a pipeline output rather than imported data
pub fn is_derived_field(field: &str) -> bool {
    DERIVED_FIELDS.contains(&field)
}

/// A stored field value
///
/// The store returns either the bare scalar or an object carrying the scalar
/// under `value` next to metadata such as validation messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Wrapped {
        value: Value,
        #[serde(flatten)]
        meta: Map<String, Value>,
    },
    Bare(Value),
}

impl FieldValue {
    /// Wrap a scalar in the form the store expects on write
    pub fn wrap(value: Value) -> Self {
        FieldValue::Wrapped {
            value,
            meta: Map::new(),
        }
    }

    /// The underlying scalar, regardless of representation
    pub fn value(&self) -> &Value {
        match self {
            FieldValue::Wrapped { value, .. } => value,
            FieldValue::Bare(value) => value,
        }
    }

    /// Metadata attached by the store (empty for bare values)
    pub fn meta(&self) -> Option<&Map<String, Value>> {
        match self {
            FieldValue::Wrapped { meta, .. } => Some(meta),
            FieldValue::Bare(_) => None,
        }
    }
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        FieldValue::Bare(value)
    }
}

/// A single contact row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    #[serde(default)]
    pub values: HashMap<String, FieldValue>,
}

impl Record {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            values: HashMap::new(),
        }
    }

    /// Builder-style field setter, stores the bare form
    pub fn with_field(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values
            .insert(field.into(), FieldValue::Bare(value.into()));
        self
    }

    /// Read a field's scalar. Absent and JSON null both read as `None`.
    pub fn read_field(&self, field: &str) -> Option<&Value> {
        self.values
            .get(field)
            .map(FieldValue::value)
            .filter(|v| !v.is_null())
    }

    /// Write a field, always in wrapped form
    pub fn write_field(&mut self, field: impl Into<String>, value: Value) {
        self.values.insert(field.into(), FieldValue::wrap(value));
    }

    pub fn read_str(&self, field: &str) -> Option<&str> {
        self.read_field(field).and_then(Value::as_str)
    }

    pub fn read_bool(&self, field: &str) -> Option<bool> {
        self.read_field(field).and_then(Value::as_bool)
    }

    /// Apply a set of field updates to this record
    pub fn apply(&mut self, update: &RecordUpdate) {
        for field_update in update.values.values() {
            self.write_field(field_update.field.clone(), field_update.value.clone());
        }
    }
}

/// New value for a single field
#[derive(Debug, Clone, PartialEq)]
pub struct FieldUpdate {
    pub field: String,
    pub value: Value,
}

/// The changed fields of one record
///
/// Only fields that differ from the stored value are ever present; a record
/// update is never a full-row rewrite.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordUpdate {
    pub id: String,
    pub values: BTreeMap<String, FieldUpdate>,
}

impl RecordUpdate {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            values: BTreeMap::new(),
        }
    }

    pub fn set(&mut self, field: &str, value: impl Into<Value>) {
        self.values.insert(
            field.to_string(),
            FieldUpdate {
                field: field.to_string(),
                value: value.into(),
            },
        );
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values.get(field).map(|u| &u.value)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }
}

// Wire form: {"id": "...", "values": {"field": {"value": ...}}}
impl Serialize for RecordUpdate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let values: BTreeMap<&str, FieldValue> = self
            .values
            .iter()
            .map(|(name, update)| (name.as_str(), FieldValue::wrap(update.value.clone())))
            .collect();

        let mut state = serializer.serialize_struct("RecordUpdate", 2)?;
        state.serialize_field("id", &self.id)?;
        state.serialize_field("values", &values)?;
        state.end()
    }
}

/// Record list response from the store
///
/// Two envelope shapes are accepted and flattened by [`RecordsEnvelope::into_records`]
/// so nothing past the client sees the transport shape.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RecordsEnvelope {
    /// `{"data": {"records": [...]}}`
    Nested { data: RecordsPage },
    /// `{"records": [...]}`
    TopLevel { records: Vec<Record> },
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecordsPage {
    #[serde(default)]
    pub records: Vec<Record>,
}

impl RecordsEnvelope {
    pub fn into_records(self) -> Vec<Record> {
        match self {
            RecordsEnvelope::Nested { data } => data.records,
            RecordsEnvelope::TopLevel { records } => records,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_read_unwraps_both_forms() {
        let record: Record = serde_json::from_value(json!({
            "id": "us_rc_1",
            "values": {
                "firstName": "danielle",
                "lastName": {"value": "adams", "messages": [], "valid": true}
            }
        }))
        .unwrap();

        assert_eq!(record.read_str(FIRST_NAME), Some("danielle"));
        assert_eq!(record.read_str(LAST_NAME), Some("adams"));
        assert!(record.values[LAST_NAME].meta().unwrap().contains_key("messages"));
        assert!(record.values[FIRST_NAME].meta().is_none());
    }

    #[test]
    fn test_null_reads_as_absent() {
        let record: Record = serde_json::from_value(json!({
            "id": "1",
            "values": {"phone": {"value": null}, "email": null}
        }))
        .unwrap();

        assert_eq!(record.read_field(PHONE), None);
        assert_eq!(record.read_field(EMAIL), None);
        assert_eq!(record.read_field(FIRST_NAME), None);
    }

    #[test]
    fn test_write_always_wraps() {
        let mut record = Record::new("1").with_field(PHONE, "5551234567");
        record.write_field(PHONE, json!("+1 (555) 123-4567"));

        assert_eq!(
            serde_json::to_value(&record.values[PHONE]).unwrap(),
            json!({"value": "+1 (555) 123-4567"})
        );
    }

    #[test]
    fn test_apply_update() {
        let mut record = Record::new("1")
            .with_field(FIRST_NAME, "JOHN")
            .with_field(EMAIL, "john@example.com");
        let mut update = RecordUpdate::new("1");
        update.set(FIRST_NAME, "John");
        update.set(IS_USA_NUMBER, false);

        record.apply(&update);

        assert_eq!(record.read_str(FIRST_NAME), Some("John"));
        assert_eq!(record.read_bool(IS_USA_NUMBER), Some(false));
        assert_eq!(record.read_str(EMAIL), Some("john@example.com"));
    }

    #[test]
    fn test_update_wire_shape() {
        let mut update = RecordUpdate::new("us_rc_7");
        update.set(PHONE, "+1 (555) 123-4567");
        update.set(IS_USA_NUMBER, true);

        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            json!({
                "id": "us_rc_7",
                "values": {
                    "isUSANumber": {"value": true},
                    "phone": {"value": "+1 (555) 123-4567"}
                }
            })
        );
    }

    #[test]
    fn test_envelope_shapes() {
        let nested: RecordsEnvelope = serde_json::from_value(json!({
            "data": {"records": [{"id": "a", "values": {}}, {"id": "b", "values": {}}]}
        }))
        .unwrap();
        let top: RecordsEnvelope = serde_json::from_value(json!({
            "records": [{"id": "c", "values": {"firstName": "x"}}]
        }))
        .unwrap();

        let nested_ids: Vec<String> = nested.into_records().into_iter().map(|r| r.id).collect();
        assert_eq!(nested_ids, vec!["a", "b"]);

        let top = top.into_records();
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].read_str(FIRST_NAME), Some("x"));
    }

    #[test]
    fn test_envelope_without_records_is_empty() {
        let nested: RecordsEnvelope = serde_json::from_value(json!({"data": {}})).unwrap();
        assert!(nested.into_records().is_empty());
    }

    #[test]
    fn test_derived_fields() {
        assert!(is_derived_field(DUPLICATE_STATUS));
        assert!(is_derived_field(IS_USA_NUMBER));
        assert!(!is_derived_field(PHONE));
    }
}
