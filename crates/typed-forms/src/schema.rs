//! Schema descriptors: typed field declarations, defaults, and the
//! validation dispatch table.
//!
//! A [`Schema`] is built once with a [`SchemaBuilder`] and never mutated
//! afterwards; share it with `Arc<Schema>`. Building fails if two fields
//! share a name, two rules are registered for the same constraint
//! signature, or a default does not fit its field.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::Arc;

use typed_forms_core::{FormSettings, FormsError, FormsResult, Value};

use crate::cast::cast;
use crate::changeset::Changeset;
use crate::constraints::{ConstraintSignature, Constraints, ValidationRule};
use crate::record::Record;

/// The declared type of a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    /// A 64-bit signed integer.
    Integer,
    /// A finite 64-bit float.
    Float,
    /// A boolean.
    Boolean,
    /// A UTF-8 string.
    String,
    /// A calendar date (`YYYY-MM-DD`).
    Date,
    /// A date and time without timezone.
    DateTime,
    /// A time of day (`HH:MM` or `HH:MM:SS`).
    Time,
    /// A UUID.
    Uuid,
    /// An arbitrary JSON document.
    Json,
    /// A list whose elements all have the inner type.
    Array(Box<FieldType>),
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer => write!(f, "integer"),
            Self::Float => write!(f, "float"),
            Self::Boolean => write!(f, "boolean"),
            Self::String => write!(f, "string"),
            Self::Date => write!(f, "date"),
            Self::DateTime => write!(f, "datetime"),
            Self::Time => write!(f, "time"),
            Self::Uuid => write!(f, "uuid"),
            Self::Json => write!(f, "json"),
            Self::Array(inner) => write!(f, "array of {inner}"),
        }
    }
}

/// Declaration of a single field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    /// The field name, unique within its schema.
    pub name: String,
    /// The declared type.
    pub field_type: FieldType,
    /// The field-level default; a schema-level default for the same field wins.
    pub default: Option<Value>,
    /// Whether a null value is a validation error.
    pub required: bool,
    /// Human-readable label.
    pub label: String,
    /// Custom error messages keyed by error code (`"cast"`, `"required"`).
    pub error_messages: BTreeMap<String, String>,
}

impl FieldSpec {
    /// Creates an optional field with no default.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        let name = name.into();
        let label = name.replace('_', " ");
        Self {
            name,
            field_type,
            default: None,
            required: false,
            label,
            error_messages: BTreeMap::new(),
        }
    }

    /// Sets the field-level default value.
    #[must_use]
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Sets whether this field is required.
    #[must_use]
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Sets the label.
    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Sets a custom error message for a given code.
    #[must_use]
    pub fn error_message(mut self, code: impl Into<String>, msg: impl Into<String>) -> Self {
        self.error_messages.insert(code.into(), msg.into());
        self
    }

    /// Returns the custom message for `code`, if one was set.
    pub fn message_for(&self, code: &str) -> Option<&str> {
        self.error_messages.get(code).map(String::as_str)
    }
}

/// An immutable set of typed fields plus defaults and validation rules.
pub struct Schema {
    name: String,
    fields: Vec<FieldSpec>,
    defaults: BTreeMap<String, Value>,
    rules: BTreeMap<ConstraintSignature, Arc<dyn ValidationRule>>,
}

impl Schema {
    /// Starts building a schema with the given name.
    pub fn builder(name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the declared fields in declaration order.
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Looks up a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Returns the effective defaults: field-level defaults overlaid with
    /// schema-level defaults.
    pub fn defaults(&self) -> BTreeMap<String, Value> {
        let mut defaults: BTreeMap<String, Value> = self
            .fields
            .iter()
            .filter_map(|f| f.default.clone().map(|v| (f.name.clone(), v)))
            .collect();
        for (field, value) in &self.defaults {
            defaults.insert(field.clone(), value.clone());
        }
        defaults
    }

    /// Returns a record with every field set to its effective default (see
    /// [`defaults`](Self::defaults)), or `Null` when it has none.
    pub fn blank_record(&self) -> Record {
        let mut defaults = self.defaults();
        self.fields
            .iter()
            .map(|f| {
                let value = defaults.remove(&f.name).unwrap_or(Value::Null);
                (f.name.clone(), value)
            })
            .collect()
    }

    /// Returns the constraint signatures with a registered rule.
    pub fn signatures(&self) -> impl Iterator<Item = &ConstraintSignature> {
        self.rules.keys()
    }

    /// Builds constraints for one call, checking that their shape has a rule.
    ///
    /// Empty constraints always succeed and select the default rule. A
    /// non-empty shape with no registered rule is an error. The rule itself
    /// is looked up again by whichever engine the constraints are passed to.
    ///
    /// # Examples
    ///
    /// ```
    /// use typed_forms::prelude::*;
    ///
    /// let schema = Schema::builder("order")
    ///     .field(FieldSpec::new("qty", FieldType::Integer))
    ///     .validate_constrained(["max_qty"], |_, _| {})
    ///     .build()
    ///     .unwrap();
    ///
    /// assert!(schema.constraints([("max_qty", 10)]).is_ok());
    /// assert!(schema.constraints([("min_qty", 1)]).is_err());
    /// ```
    pub fn constraints<I, K, V>(&self, pairs: I) -> FormsResult<Constraints>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let values: BTreeMap<String, Value> = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        if values.is_empty() {
            return Ok(Constraints::none());
        }

        let constraints = Constraints::from_values(values);
        let signature = constraints.signature();
        if self.rules.contains_key(&signature) {
            Ok(constraints)
        } else {
            tracing::warn!(schema = %self.name, %signature, "unrecognized constraint shape");
            Err(FormsError::UnrecognizedConstraints {
                schema: self.name.clone(),
                signature: signature.to_string(),
            })
        }
    }

    /// Returns the rule registered for `signature`, if any.
    pub(crate) fn rule_for(&self, signature: &ConstraintSignature) -> Option<&Arc<dyn ValidationRule>> {
        self.rules.get(signature)
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("name", &self.name)
            .field("fields", &self.fields)
            .field("defaults", &self.defaults)
            .field("rules", &self.rules.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Builder for [`Schema`].
pub struct SchemaBuilder {
    name: String,
    fields: Vec<FieldSpec>,
    defaults: Vec<(String, Value)>,
    rules: Vec<(ConstraintSignature, Arc<dyn ValidationRule>)>,
    settings: FormSettings,
}

impl SchemaBuilder {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            defaults: Vec::new(),
            rules: Vec::new(),
            settings: FormSettings::default(),
        }
    }

    /// Sets the settings used to cast defaults in [`build`](Self::build).
    ///
    /// Pass the same settings the engine will run with when defaults are
    /// given as raw strings, e.g. custom boolean literals.
    #[must_use]
    pub fn cast_settings(mut self, settings: FormSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Adds a field.
    #[must_use]
    pub fn field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    /// Adds a schema-level default, which overrides the field's own default.
    #[must_use]
    pub fn default_value(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.defaults.push((field.into(), value.into()));
        self
    }

    /// Registers the rule used when no constraints are passed.
    #[must_use]
    pub fn validate<F>(self, rule: F) -> Self
    where
        F: Fn(&mut Changeset<'_>, &Constraints) + Send + Sync + 'static,
    {
        self.rule(ConstraintSignature::empty(), Arc::new(rule))
    }

    /// Registers the rule used when constraints with exactly these keys are passed.
    #[must_use]
    pub fn validate_constrained<I, K, F>(self, keys: I, rule: F) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
        F: Fn(&mut Changeset<'_>, &Constraints) + Send + Sync + 'static,
    {
        self.rule(ConstraintSignature::of(keys), Arc::new(rule))
    }

    /// Registers an already boxed rule for a signature.
    #[must_use]
    pub fn rule(mut self, signature: ConstraintSignature, rule: Arc<dyn ValidationRule>) -> Self {
        self.rules.push((signature, rule));
        self
    }

    /// Validates the declarations and builds the schema.
    ///
    /// Defaults are cast once here and stored as typed values. Casting uses
    /// [`FormSettings::default`] unless [`cast_settings`](Self::cast_settings)
    /// was called.
    pub fn build(self) -> FormsResult<Schema> {
        let settings = self.settings;

        let mut seen = HashSet::new();
        let mut fields = Vec::with_capacity(self.fields.len());
        for mut field in self.fields {
            if !seen.insert(field.name.clone()) {
                return Err(FormsError::DuplicateField {
                    schema: self.name,
                    field: field.name,
                });
            }
            if let Some(default) = &field.default {
                field.default = Some(cast_default(&field, default, &settings)?);
            }
            fields.push(field);
        }

        let mut defaults = BTreeMap::new();
        for (name, value) in self.defaults {
            let Some(field) = fields.iter().find(|f| f.name == name) else {
                return Err(FormsError::UnknownField {
                    schema: self.name,
                    field: name,
                });
            };
            let value = cast_default(field, &value, &settings)?;
            defaults.insert(name, value);
        }

        let mut rules = BTreeMap::new();
        for (signature, rule) in self.rules {
            match rules.entry(signature) {
                Entry::Vacant(slot) => {
                    slot.insert(rule);
                }
                Entry::Occupied(slot) => {
                    return Err(FormsError::DuplicateValidation {
                        schema: self.name,
                        signature: slot.key().to_string(),
                    });
                }
            }
        }

        tracing::debug!(
            schema = %self.name,
            fields = fields.len(),
            rules = rules.len(),
            "schema built"
        );

        Ok(Schema {
            name: self.name,
            fields,
            defaults,
            rules,
        })
    }
}

fn cast_default(field: &FieldSpec, value: &Value, settings: &FormSettings) -> FormsResult<Value> {
    cast(&field.field_type, value, settings).map_err(|e| FormsError::InvalidDefault {
        field: field.name.clone(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order_schema() -> Schema {
        Schema::builder("order")
            .field(FieldSpec::new("qty", FieldType::Integer).default(1))
            .field(FieldSpec::new("note", FieldType::String))
            .field(FieldSpec::new("gift", FieldType::Boolean).default(false))
            .build()
            .unwrap()
    }

    #[test]
    fn test_fields_keep_declaration_order() {
        let schema = order_schema();
        let names: Vec<&str> = schema.fields().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["qty", "note", "gift"]);
        assert_eq!(schema.field("note").unwrap().field_type, FieldType::String);
        assert!(schema.field("missing").is_none());
    }

    #[test]
    fn test_duplicate_field_fails() {
        let result = Schema::builder("order")
            .field(FieldSpec::new("qty", FieldType::Integer))
            .field(FieldSpec::new("qty", FieldType::String))
            .build();
        match result {
            Err(FormsError::DuplicateField { field, .. }) => assert_eq!(field, "qty"),
            other => panic!("expected DuplicateField, got {other:?}"),
        }
    }

    #[test]
    fn test_defaults_schema_level_overrides_field_level() {
        let schema = Schema::builder("order")
            .field(FieldSpec::new("qty", FieldType::Integer).default(1))
            .field(FieldSpec::new("note", FieldType::String).default("none"))
            .default_value("qty", 2)
            .build()
            .unwrap();
        let defaults = schema.defaults();
        assert_eq!(defaults.get("qty"), Some(&Value::Int(2)));
        assert_eq!(defaults.get("note"), Some(&Value::from("none")));
    }

    #[test]
    fn test_defaults_are_cast() {
        let schema = Schema::builder("order")
            .field(FieldSpec::new("qty", FieldType::Integer).default("3"))
            .build()
            .unwrap();
        assert_eq!(schema.defaults().get("qty"), Some(&Value::Int(3)));
    }

    #[test]
    fn test_invalid_default_fails() {
        let result = Schema::builder("order")
            .field(FieldSpec::new("qty", FieldType::Integer).default("lots"))
            .build();
        assert!(matches!(result, Err(FormsError::InvalidDefault { .. })));
    }

    #[test]
    fn test_default_for_unknown_field_fails() {
        let result = Schema::builder("order")
            .field(FieldSpec::new("qty", FieldType::Integer))
            .default_value("price", 3)
            .build();
        assert!(matches!(result, Err(FormsError::UnknownField { .. })));
    }

    #[test]
    fn test_blank_record_uses_effective_defaults() {
        let schema = Schema::builder("order")
            .field(FieldSpec::new("qty", FieldType::Integer).default(1))
            .field(FieldSpec::new("unit", FieldType::String))
            .field(FieldSpec::new("note", FieldType::String))
            .default_value("qty", 9)
            .default_value("unit", "box")
            .build()
            .unwrap();
        let blank = schema.blank_record();
        assert_eq!(blank.value("qty"), &Value::Int(9));
        assert_eq!(blank.value("unit"), &Value::from("box"));
        assert_eq!(blank.value("note"), &Value::Null);
        assert_eq!(blank.len(), 3);
    }

    #[test]
    fn test_cast_settings_apply_to_defaults() {
        let yes_no = FormSettings {
            true_literals: vec!["yes".to_string()],
            false_literals: vec!["no".to_string()],
            ..FormSettings::default()
        };
        let builder = || {
            Schema::builder("prefs")
                .field(FieldSpec::new("newsletter", FieldType::Boolean).default("yes"))
        };

        assert!(matches!(builder().build(), Err(FormsError::InvalidDefault { .. })));
        let schema = builder().cast_settings(yes_no).build().unwrap();
        assert_eq!(schema.blank_record().value("newsletter"), &Value::Bool(true));
    }

    #[test]
    fn test_duplicate_validation_fails() {
        let result = Schema::builder("order")
            .field(FieldSpec::new("qty", FieldType::Integer))
            .validate_constrained(["max_qty", "min_qty"], |_, _| {})
            .validate_constrained(["min_qty", "max_qty"], |_, _| {})
            .build();
        match result {
            Err(FormsError::DuplicateValidation { signature, .. }) => {
                assert_eq!(signature, "[max_qty, min_qty]");
            }
            other => panic!("expected DuplicateValidation, got {other:?}"),
        }
    }

    #[test]
    fn test_constraints_resolution() {
        let schema = Schema::builder("order")
            .field(FieldSpec::new("qty", FieldType::Integer))
            .validate_constrained(["max_qty"], |_, _| {})
            .build()
            .unwrap();

        let c = schema.constraints([("max_qty", 10)]).unwrap();
        assert_eq!(c.get_int("max_qty"), Some(10));

        let empty: [(&str, i64); 0] = [];
        assert!(schema.constraints(empty).unwrap().is_empty());

        match schema.constraints([("max_qty", 10), ("min_qty", 1)]) {
            Err(FormsError::UnrecognizedConstraints { signature, .. }) => {
                assert_eq!(signature, "[max_qty, min_qty]");
            }
            other => panic!("expected UnrecognizedConstraints, got {other:?}"),
        }
    }

    #[test]
    fn test_signatures_listed() {
        let schema = Schema::builder("order")
            .validate(|_, _| {})
            .validate_constrained(["max_qty"], |_, _| {})
            .build()
            .unwrap();
        assert_eq!(schema.signatures().count(), 2);
        assert!(schema.rule_for(&ConstraintSignature::empty()).is_some());
        assert!(schema.rule_for(&ConstraintSignature::of(["min_qty"])).is_none());
    }

    #[test]
    fn test_field_spec_builder_chain() {
        let field = FieldSpec::new("unit_price", FieldType::Float)
            .required(true)
            .label("Price")
            .error_message("cast", "Enter a price.");
        assert!(field.required);
        assert_eq!(field.label, "Price");
        assert_eq!(field.message_for("cast"), Some("Enter a price."));
        assert_eq!(FieldSpec::new("unit_price", FieldType::Float).label, "unit price");
    }

    #[test]
    fn test_field_type_display() {
        assert_eq!(FieldType::Integer.to_string(), "integer");
        assert_eq!(FieldType::DateTime.to_string(), "datetime");
        assert_eq!(
            FieldType::Array(Box::new(FieldType::String)).to_string(),
            "array of string"
        );
    }
}
