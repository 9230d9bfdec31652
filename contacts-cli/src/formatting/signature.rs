//! Row signatures for duplicate detection

use serde_json::Value;
use std::collections::HashMap;

use crate::api::models::{FieldValue, is_derived_field};

pub const SIGNATURE_DELIMITER: &str = "|";

/// Build the order-independent signature of a field map
///
/// Each non-null field renders as `name:value`; the pairs are sorted and
/// joined with `|`. Fields the pipeline writes itself are left out, otherwise
/// a row's own duplicate status would change its signature on the next run.
pub fn signature(fields: &HashMap<String, FieldValue>) -> String {
    let mut pairs: Vec<String> = fields
        .iter()
        .filter(|(name, _)| !is_derived_field(name))
        .filter_map(|(name, field)| match field.value() {
            Value::Null => None,
            value => Some(format!("{}:{}", name, render(value))),
        })
        .collect();

    pairs.sort();
    pairs.join(SIGNATURE_DELIMITER)
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Occurrence count of every signature in a batch
#[derive(Debug, Clone, Default)]
pub struct SignatureCounts {
    counts: HashMap<String, usize>,
}

impl SignatureCounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one more occurrence, returning the new total
    pub fn record(&mut self, signature: &str) -> usize {
        let count = self.counts.entry(signature.to_string()).or_insert(0);
        *count += 1;
        *count
    }

    pub fn count(&self, signature: &str) -> usize {
        self.counts.get(signature).copied().unwrap_or(0)
    }

    /// Signatures seen more than once
    pub fn duplicate_groups(&self) -> usize {
        self.counts.values().filter(|&&c| c > 1).count()
    }

    /// Rows that belong to a duplicate group
    pub fn duplicate_rows(&self) -> usize {
        self.counts.values().filter(|&&c| c > 1).sum()
    }
}

impl<S: AsRef<str>> FromIterator<S> for SignatureCounts {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut counts = Self::new();
        for signature in iter {
            counts.record(signature.as_ref());
        }
        counts
    }
}
