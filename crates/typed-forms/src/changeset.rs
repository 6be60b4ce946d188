//! The changeset engine: casting raw input, collecting field errors, and
//! deciding whether a result may be committed.
//!
//! [`ChangesetEngine::apply`] walks the schema's fields, casts the raw value
//! of every field present in the input, runs the validation rule selected by
//! the call's [`Constraints`], and returns either the fully updated
//! [`Record`] or a [`Rejection`] carrying the errors and a partially updated
//! record for re-rendering.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::{Bound, RangeBounds};
use std::sync::Arc;

use regex::Regex;
use serde::Serialize;
use typed_forms_core::logging::form_span;
use typed_forms_core::{FormSettings, ValidationError, Value};

use crate::cast::cast;
use crate::constraints::Constraints;
use crate::raw_input::RawInput;
use crate::record::Record;
use crate::schema::Schema;
use crate::validators::{
    FormatValidator, InclusionValidator, MaxLengthValidator, MinLengthValidator, NumberValidator,
    Validator,
};

const BLANK_MESSAGE: &str = "can't be blank";

/// Error key used when the engine's schema has no rule for the constraints.
pub const CONSTRAINTS_KEY: &str = "constraints";

/// The origin of a field error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The raw value could not be converted to the field's type.
    Cast,
    /// A validation rule rejected the cast value.
    Validation,
}

/// A single error attached to a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub kind: ErrorKind,
    pub message: String,
    /// Short machine-readable code, e.g. `"cast"` or `"greater_than"`.
    pub code: String,
}

impl FieldError {
    pub fn cast(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Cast,
            message: message.into(),
            code: "cast".to_string(),
        }
    }

    pub fn validation(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Validation,
            message: message.into(),
            code: code.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl From<ValidationError> for FieldError {
    fn from(err: ValidationError) -> Self {
        Self::validation(err.message, err.code)
    }
}

/// Errors grouped by field name, in insertion order per field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors {
    errors: BTreeMap<String, Vec<FieldError>>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an error for `field`.
    pub fn add(&mut self, field: impl Into<String>, error: FieldError) {
        self.errors.entry(field.into()).or_default().push(error);
    }

    /// Returns the errors for `field`, empty if it has none.
    pub fn get(&self, field: &str) -> &[FieldError] {
        self.errors.get(field).map(Vec::as_slice).unwrap_or_default()
    }

    /// Returns the messages for `field`.
    pub fn messages(&self, field: &str) -> Vec<&str> {
        self.get(field).iter().map(|e| e.message.as_str()).collect()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.errors.contains_key(field)
    }

    /// Returns `true` if `field` has an error of the given kind.
    pub fn has_kind(&self, field: &str, kind: ErrorKind) -> bool {
        self.get(field).iter().any(|e| e.kind == kind)
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Number of fields with at least one error.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Total number of errors across all fields.
    pub fn count(&self) -> usize {
        self.errors.values().map(Vec::len).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[FieldError])> {
        self.errors.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}

/// A failed changeset: the errors plus the record to re-render.
///
/// `record` is the existing record with the changes of error-free fields
/// applied; fields with errors keep their previous value. It is never
/// meant to be persisted.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{} field(s) failed validation", .errors.len())]
pub struct Rejection {
    pub errors: FieldErrors,
    pub record: Record,
}

/// The outcome of one [`ChangesetEngine::apply`] call.
///
/// Only `Ok` carries a record that may be persisted.
pub type ChangesetResult = Result<Record, Rejection>;

/// One in-flight application of raw input to an existing record.
///
/// Validation rules receive a `&mut Changeset` after casting. They read
/// values with [`get_field`](Self::get_field) and report problems with the
/// `validate_*` helpers or [`add_error`](Self::add_error).
#[derive(Debug)]
pub struct Changeset<'a> {
    schema: &'a Schema,
    data: Record,
    params: &'a RawInput,
    changes: BTreeMap<String, Value>,
    errors: FieldErrors,
}

impl<'a> Changeset<'a> {
    fn new(schema: &'a Schema, data: Record, params: &'a RawInput) -> Self {
        Self {
            schema,
            data,
            params,
            changes: BTreeMap::new(),
            errors: FieldErrors::new(),
        }
    }

    pub fn schema(&self) -> &'a Schema {
        self.schema
    }

    /// The record the input is applied to.
    pub fn data(&self) -> &Record {
        &self.data
    }

    /// The raw input for this call.
    pub fn params(&self) -> &'a RawInput {
        self.params
    }

    /// Cast values that differ from [`data`](Self::data).
    pub fn changes(&self) -> &BTreeMap<String, Value> {
        &self.changes
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns the pending change for `field`, if any.
    pub fn get_change(&self, field: &str) -> Option<&Value> {
        self.changes.get(field)
    }

    /// Returns the current value of `field`: its change if there is one,
    /// otherwise its value in the existing record, otherwise `Null`.
    pub fn get_field(&self, field: &str) -> &Value {
        self.changes
            .get(field)
            .unwrap_or_else(|| self.data.value(field))
    }

    /// Sets a change directly, bypassing casting.
    ///
    /// A value equal to the existing one removes any pending change.
    pub fn put_change(&mut self, field: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        let field = field.into();
        let value = value.into();
        if self.data.value(&field) == &value {
            self.changes.remove(&field);
        } else {
            self.changes.insert(field, value);
        }
        self
    }

    /// Adds a validation error with the generic `"validation"` code.
    pub fn add_error(&mut self, field: &str, message: impl Into<String>) -> &mut Self {
        self.add_error_with_code(field, message, "validation")
    }

    /// Adds a validation error with an explicit code.
    ///
    /// A custom message registered on the field for `code` replaces `message`.
    pub fn add_error_with_code(
        &mut self,
        field: &str,
        message: impl Into<String>,
        code: impl Into<String>,
    ) -> &mut Self {
        let error = FieldError::validation(message, code);
        self.push_validation(field, error);
        self
    }

    fn push_validation(&mut self, field: &str, mut error: FieldError) {
        match self.schema.field(field) {
            Some(spec) => {
                if let Some(custom) = spec.message_for(&error.code) {
                    error.message = custom.to_string();
                }
            }
            None => {
                tracing::warn!(schema = %self.schema.name(), field, "error added for undeclared field");
            }
        }
        self.errors.add(field, error);
    }

    /// Runs `validator` against the current value of `field`.
    ///
    /// Null values and fields that failed to cast are skipped.
    pub fn validate_with(&mut self, field: &str, validator: &dyn Validator) -> &mut Self {
        if self.errors.has_kind(field, ErrorKind::Cast) {
            return self;
        }
        let outcome = {
            let value = self.get_field(field);
            (!value.is_null()).then(|| validator.validate(value))
        };
        if let Some(Err(err)) = outcome {
            tracing::trace!(field, validator = validator.name(), "validation failed");
            self.push_validation(field, err.into());
        }
        self
    }

    /// Checks a numeric field against the given comparisons.
    pub fn validate_number(&mut self, field: &str, validator: NumberValidator) -> &mut Self {
        self.validate_with(field, &validator)
    }

    /// Checks that a string (or list) field has a length within `range`.
    pub fn validate_length(&mut self, field: &str, range: impl RangeBounds<usize>) -> &mut Self {
        let min = match range.start_bound() {
            Bound::Included(&n) => Some(n),
            Bound::Excluded(&n) => Some(n.saturating_add(1)),
            Bound::Unbounded => None,
        };
        let max = match range.end_bound() {
            Bound::Included(&n) => Some(n),
            Bound::Excluded(&n) => Some(n.saturating_sub(1)),
            Bound::Unbounded => None,
        };
        if let Some(min) = min {
            self.validate_with(field, &MinLengthValidator::new(min));
        }
        if let Some(max) = max {
            if !self.errors.contains(field) {
                self.validate_with(field, &MaxLengthValidator::new(max));
            }
        }
        self
    }

    /// Checks that `field` is one of `allowed`.
    pub fn validate_inclusion<I, V>(&mut self, field: &str, allowed: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.validate_with(field, &InclusionValidator::new(allowed))
    }

    /// Checks that a string field matches `regex`.
    pub fn validate_format(&mut self, field: &str, regex: &Regex) -> &mut Self {
        self.validate_with(field, &FormatValidator::from_regex(regex.clone()))
    }

    /// Checks that each of `fields` has a non-null value.
    pub fn validate_required(&mut self, fields: &[&str]) -> &mut Self {
        for &field in fields {
            if self.errors.has_kind(field, ErrorKind::Cast)
                || self.get(field).iter().any(|e| e.code == "required")
            {
                continue;
            }
            if self.get_field(field).is_null() {
                self.add_error_with_code(field, BLANK_MESSAGE, "required");
            }
        }
        self
    }

    /// Runs `check` on the pending change for `field`, if there is one.
    ///
    /// An `Err` message becomes a validation error on the field.
    pub fn validate_change<F>(&mut self, field: &str, check: F) -> &mut Self
    where
        F: FnOnce(&Value) -> Result<(), String>,
    {
        let outcome = self.changes.get(field).map(check);
        if let Some(Err(message)) = outcome {
            self.add_error(field, message);
        }
        self
    }

    fn get(&self, field: &str) -> &[FieldError] {
        self.errors.get(field)
    }

    /// Finishes the changeset.
    ///
    /// Without errors every change is applied. With errors, only the
    /// changes of fields without errors are applied to the returned record.
    pub fn into_result(self) -> ChangesetResult {
        if self.errors.is_empty() {
            return Ok(self.data.merged(&self.changes));
        }
        let errors = &self.errors;
        let record = self
            .data
            .merged(self.changes.iter().filter(|(field, _)| !errors.contains(field)));
        Err(Rejection {
            errors: self.errors,
            record,
        })
    }
}

/// Applies raw input to records of one schema.
#[derive(Debug, Clone)]
pub struct ChangesetEngine {
    schema: Arc<Schema>,
    settings: FormSettings,
}

impl ChangesetEngine {
    /// Creates an engine with default settings.
    pub fn new(schema: Arc<Schema>) -> Self {
        Self::with_settings(schema, FormSettings::default())
    }

    pub fn with_settings(schema: Arc<Schema>, settings: FormSettings) -> Self {
        Self { schema, settings }
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn settings(&self) -> &FormSettings {
        &self.settings
    }

    /// Casts `raw` onto `existing` and runs validation, returning the open
    /// changeset for inspection.
    pub fn changeset<'a>(
        &'a self,
        existing: &Record,
        raw: &'a RawInput,
        constraints: &Constraints,
    ) -> Changeset<'a> {
        let schema: &Schema = &self.schema;
        let mut cs = Changeset::new(schema, existing.clone(), raw);

        for spec in schema.fields() {
            let Some(raw_value) = raw.get(&spec.name) else {
                continue;
            };
            match cast(&spec.field_type, raw_value, &self.settings) {
                Ok(value) => {
                    if existing.value(&spec.name) != &value {
                        cs.changes.insert(spec.name.clone(), value);
                    }
                }
                Err(err) => {
                    tracing::trace!(field = %spec.name, error = %err, "cast failed");
                    let message = spec
                        .message_for("cast")
                        .map_or_else(|| err.to_string(), str::to_string);
                    cs.errors.add(spec.name.clone(), FieldError::cast(message));
                }
            }
        }

        for (key, _) in raw.iter() {
            if schema.field(key).is_none() {
                tracing::trace!(field = key, "ignoring undeclared input");
            }
        }

        let required: Vec<&str> = schema
            .fields()
            .iter()
            .filter(|f| f.required)
            .map(|f| f.name.as_str())
            .collect();
        cs.validate_required(&required);

        let signature = constraints.signature();
        match schema.rule_for(&signature) {
            Some(rule) => rule.validate(&mut cs, constraints),
            None if signature.is_empty() => {}
            None => {
                tracing::warn!(schema = %schema.name(), %signature, "no rule for constraints");
                cs.errors.add(
                    CONSTRAINTS_KEY,
                    FieldError::validation(
                        format!("constraints {signature} are not recognized"),
                        "unrecognized_constraints",
                    ),
                );
            }
        }

        cs
    }

    /// Applies `raw` to `existing` under `constraints`.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::sync::Arc;
    /// use typed_forms::prelude::*;
    ///
    /// let schema = Schema::builder("order")
    ///     .field(FieldSpec::new("qty", FieldType::Integer))
    ///     .build()
    ///     .unwrap();
    /// let engine = ChangesetEngine::new(Arc::new(schema));
    ///
    /// let raw = RawInput::new().with("qty", "abc");
    /// let rejection = engine.apply(&Record::new(), &raw, &Constraints::none()).unwrap_err();
    /// assert_eq!(rejection.errors.messages("qty"), vec!["cannot cast 'abc' to integer"]);
    /// ```
    pub fn apply(&self, existing: &Record, raw: &RawInput, constraints: &Constraints) -> ChangesetResult {
        let span = form_span(self.schema.name(), "apply");
        let _guard = span.enter();

        let cs = self.changeset(existing, raw, constraints);
        tracing::debug!(
            changes = cs.changes.len(),
            errors = cs.errors.count(),
            "changeset applied"
        );
        cs.into_result()
    }
}
