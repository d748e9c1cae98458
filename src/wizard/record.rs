use std::collections::{BTreeMap, BTreeSet};

use serde_json::Value;

/// Flat, request-scoped validation input: profile columns (prefixed `profile_`)
/// overlaid with the in-flight form payload. Repeatable groups use dotted,
/// indexed keys such as `references.0.email`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergedRecord {
    values: BTreeMap<String, Value>,
}

impl MergedRecord {
    pub fn new(values: BTreeMap<String, Value>) -> Self {
        Self { values }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    pub fn is_blank(&self, field: &str) -> bool {
        self.values.get(field).map(is_blank).unwrap_or(true)
    }

    /// Trimmed string value, if the field holds non-blank text.
    pub fn text(&self, field: &str) -> Option<&str> {
        match self.values.get(field) {
            Some(Value::String(text)) => {
                let trimmed = text.trim();
                (!trimmed.is_empty()).then_some(trimmed)
            }
            _ => None,
        }
    }

    pub fn number(&self, field: &str) -> Option<f64> {
        self.values.get(field).and_then(number_of)
    }

    /// Truthy interpretation of a checkbox/toggle field.
    pub fn flag(&self, field: &str) -> bool {
        self.values
            .get(field)
            .and_then(bool_of)
            .unwrap_or(false)
    }

    /// Distinct indices present for a repeatable group, e.g. `references` for
    /// keys `references.0.name`, `references.2.email` yields `[0, 2]`.
    pub fn group_indices(&self, group: &str) -> Vec<usize> {
        let prefix = format!("{group}.");
        let mut indices = BTreeSet::new();
        for (key, value) in self.values.range(prefix.clone()..) {
            if !key.starts_with(&prefix) {
                break;
            }
            if is_blank(value) {
                continue;
            }
            let rest = &key[prefix.len()..];
            let segment = rest.split('.').next().unwrap_or(rest);
            if let Ok(index) = segment.parse::<usize>() {
                indices.insert(index);
            }
        }
        indices.into_iter().collect()
    }
}

/// Absent, null, blank-string, and empty-container values all count as blank.
pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => text.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(entries) => entries.is_empty(),
        _ => false,
    }
}

/// Numeric coercion mirroring how form payloads arrive: JSON numbers or
/// numeric strings.
pub fn number_of(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Boolean coercion accepting native booleans plus the usual form encodings.
pub fn bool_of(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(flag) => Some(*flag),
        Value::Number(number) => match number.as_i64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
        Value::String(text) => match text.trim() {
            "true" | "1" | "yes" => Some(true),
            "false" | "0" | "no" => Some(false),
            _ => None,
        },
        _ => None,
    }
}
