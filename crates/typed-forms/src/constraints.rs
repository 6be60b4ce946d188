//! Call-scoped constraints and the validation rules they select.
//!
//! A schema keeps a dispatch table from [`ConstraintSignature`] (the set of
//! constraint keys) to a [`ValidationRule`]. Constraints are checked against
//! that table when they are built with
//! [`Schema::constraints`](crate::schema::Schema::constraints), and the
//! engine looks the rule up again in its own schema on every call. A shape
//! with no registered rule is never silently ignored. Empty constraints
//! always select the schema's default rule.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use typed_forms_core::Value;

use crate::changeset::Changeset;

/// Validation logic attached to a schema.
///
/// Rules run after casting. They can read the changeset's current values,
/// the raw input, and the constraints for this call, and add field errors.
///
/// Any `Fn(&mut Changeset<'_>, &Constraints) + Send + Sync` closure is a rule.
pub trait ValidationRule: Send + Sync {
    /// Validates `changeset`, adding errors for violated rules.
    fn validate(&self, changeset: &mut Changeset<'_>, constraints: &Constraints);
}

impl<F> ValidationRule for F
where
    F: Fn(&mut Changeset<'_>, &Constraints) + Send + Sync,
{
    fn validate(&self, changeset: &mut Changeset<'_>, constraints: &Constraints) {
        self(changeset, constraints);
    }
}

/// The shape of a constraint set: its keys, order-independent.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConstraintSignature(BTreeSet<String>);

impl ConstraintSignature {
    /// The signature of an empty constraint set.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a signature from constraint keys.
    pub fn of<I, K>(keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        Self(keys.into_iter().map(Into::into).collect())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl fmt::Display for ConstraintSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, key) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{key}")?;
        }
        write!(f, "]")
    }
}

/// Caller-supplied, call-scoped validation parameters (e.g. `max_qty: 10`).
///
/// Constraints are never stored by the engine; pass fresh ones on every call
/// when they reflect live state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Constraints {
    values: BTreeMap<String, Value>,
}

impl Constraints {
    /// No constraints; the schema's default rule applies.
    pub fn none() -> Self {
        Self::default()
    }

    pub(crate) const fn from_values(values: BTreeMap<String, Value>) -> Self {
        Self { values }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Returns the constraint as an integer, if it is one.
    pub fn get_int(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(Value::as_int)
    }

    /// Returns the constraint as a number (integer or float).
    pub fn get_number(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(Value::as_number)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn signature(&self) -> ConstraintSignature {
        ConstraintSignature(self.values.keys().cloned().collect())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_is_order_independent() {
        let a = ConstraintSignature::of(["max_qty", "min_qty"]);
        let b = ConstraintSignature::of(["min_qty", "max_qty"]);
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "[max_qty, min_qty]");
    }

    #[test]
    fn test_empty_signature() {
        assert!(ConstraintSignature::empty().is_empty());
        assert_eq!(ConstraintSignature::empty().to_string(), "[]");
        assert_eq!(Constraints::none().signature(), ConstraintSignature::empty());
    }

    #[test]
    fn test_accessors() {
        let mut values = BTreeMap::new();
        values.insert("max_qty".to_string(), Value::Int(10));
        values.insert("ratio".to_string(), Value::Float(0.5));
        let c = Constraints::from_values(values);
        assert_eq!(c.get_int("max_qty"), Some(10));
        assert_eq!(c.get_number("max_qty"), Some(10.0));
        assert_eq!(c.get_number("ratio"), Some(0.5));
        assert_eq!(c.get_int("ratio"), None);
        assert_eq!(c.signature(), ConstraintSignature::of(["max_qty", "ratio"]));
        assert_eq!(c.iter().count(), 2);
    }
}
