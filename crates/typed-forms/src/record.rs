//! Records: schema instances holding typed field values.

use std::collections::BTreeMap;

use serde::Serialize;
use typed_forms_core::{FormsError, FormsResult, Value};

/// A mapping from field name to a cast, typed [`Value`].
///
/// Records handed back by the engine are snapshots; mutating a clone never
/// affects another caller's copy.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Record {
    values: BTreeMap<String, Value>,
}

impl Record {
    /// Creates an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns this record with `field` set to `value`.
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(field.into(), value.into());
        self
    }

    /// Sets `field` to `value`, returning the previous value.
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.values.insert(field.into(), value.into())
    }

    /// Returns the value of `field`, if present.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    /// Returns the value of `field`, treating absent fields as `Null`.
    pub fn value(&self, field: &str) -> &Value {
        self.values.get(field).unwrap_or(&Value::Null)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.values.contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates over `(field, value)` pairs in field-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns a copy of this record with `changes` applied on top.
    #[must_use]
    pub fn merged<'a, I>(&self, changes: I) -> Self
    where
        I: IntoIterator<Item = (&'a String, &'a Value)>,
    {
        let mut merged = self.clone();
        for (field, value) in changes {
            merged.values.insert(field.clone(), value.clone());
        }
        merged
    }

    /// Converts this record into a plain JSON object.
    pub fn to_json(&self) -> serde_json::Value {
        let map: serde_json::Map<String, serde_json::Value> = self
            .values
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect();
        serde_json::Value::Object(map)
    }

    // ── Typed accessors used when decoding into concrete types ───────

    /// Returns the integer value of `field`, or a decode error.
    pub fn require_int(&self, field: &str) -> FormsResult<i64> {
        self.value(field)
            .as_int()
            .ok_or_else(|| decode_error(field, "integer", self.value(field)))
    }

    /// Returns the float value of `field`, or a decode error.
    pub fn require_float(&self, field: &str) -> FormsResult<f64> {
        self.value(field)
            .as_float()
            .ok_or_else(|| decode_error(field, "float", self.value(field)))
    }

    /// Returns the boolean value of `field`, or a decode error.
    pub fn require_bool(&self, field: &str) -> FormsResult<bool> {
        self.value(field)
            .as_bool()
            .ok_or_else(|| decode_error(field, "boolean", self.value(field)))
    }

    /// Returns the string value of `field`, or a decode error.
    pub fn require_str(&self, field: &str) -> FormsResult<&str> {
        self.value(field)
            .as_str()
            .ok_or_else(|| decode_error(field, "string", self.value(field)))
    }
}

fn decode_error(field: &str, expected: &str, found: &Value) -> FormsError {
    FormsError::Decode(format!("field '{field}' is not a {expected} (found {found})"))
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
