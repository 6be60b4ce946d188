//! Form projection: turning changeset outcomes into renderable views.
//!
//! A [`TypedForm`] wraps a [`ChangesetEngine`] and always produces a
//! [`FormView`], valid or not, so a UI layer can render values and
//! per-field errors without branching on the result type. Only a valid
//! view exposes a committed [`Record`].

use std::sync::Arc;

use serde::Serialize;
use typed_forms_core::logging::form_span;
use typed_forms_core::{FormSettings, FormsResult, Value};

use crate::changeset::{ChangesetEngine, ChangesetResult, FieldError, FieldErrors};
use crate::constraints::Constraints;
use crate::raw_input::RawInput;
use crate::record::Record;
use crate::schema::Schema;

/// One field as presented to a UI.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormField {
    pub name: String,
    pub label: String,
    /// Display name of the field type, e.g. `"integer"`.
    pub field_type: String,
    /// The value to render: the cast value, or the prior value when the
    /// submitted one was rejected.
    pub value: Value,
    /// What the user submitted for this field, if anything.
    pub submitted: Option<Value>,
    pub errors: Vec<FieldError>,
}

impl FormField {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// A rendered snapshot of a form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormView {
    schema: String,
    fields: Vec<FormField>,
    errors: FieldErrors,
    record: Option<Record>,
}

impl FormView {
    /// The name of the schema this view was built from.
    pub fn schema_name(&self) -> &str {
        &self.schema
    }

    /// Fields in schema declaration order.
    pub fn fields(&self) -> &[FormField] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FormField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// The value to render for `name`.
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.field(name).map(|f| &f.value)
    }

    /// Error messages for `name`, including fields the schema does not declare.
    pub fn messages(&self, name: &str) -> Vec<&str> {
        self.errors.messages(name)
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn error_count(&self) -> usize {
        self.errors.count()
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// The committed record, present only when the view is valid.
    pub fn record(&self) -> Option<&Record> {
        self.record.as_ref()
    }

    pub fn into_record(self) -> Option<Record> {
        self.record
    }

    /// Converts the view into plain JSON for a UI layer.
    ///
    /// Values are emitted as plain JSON rather than tagged [`Value`]s.
    pub fn to_json(&self) -> serde_json::Value {
        let fields: Vec<serde_json::Value> = self
            .fields
            .iter()
            .map(|f| {
                serde_json::json!({
                    "name": f.name,
                    "label": f.label,
                    "type": f.field_type,
                    "value": f.value.to_json(),
                    "submitted": f.submitted.as_ref().map(Value::to_json),
                    "errors": f.errors.iter().map(|e| e.message.as_str()).collect::<Vec<_>>(),
                })
            })
            .collect();
        serde_json::json!({
            "schema": self.schema,
            "valid": self.is_valid(),
            "fields": fields,
            "errors": self.errors,
        })
    }
}

/// Builds [`FormView`]s for one schema.
#[derive(Debug, Clone)]
pub struct TypedForm {
    engine: ChangesetEngine,
}

impl TypedForm {
    pub fn new(schema: Arc<Schema>) -> Self {
        Self::from_engine(ChangesetEngine::new(schema))
    }

    pub fn with_settings(schema: Arc<Schema>, settings: FormSettings) -> Self {
        Self::from_engine(ChangesetEngine::with_settings(schema, settings))
    }

    pub const fn from_engine(engine: ChangesetEngine) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &ChangesetEngine {
        &self.engine
    }

    pub fn schema(&self) -> &Schema {
        self.engine.schema()
    }

    /// Builds the initial form: schema defaults overlaid with `overrides`,
    /// then validated like a submission.
    pub fn new_form(&self, overrides: &RawInput, constraints: &Constraints) -> FormView {
        let span = form_span(self.schema().name(), "new_form");
        let _guard = span.enter();

        let defaults: RawInput = self.schema().defaults().into_iter().collect();
        self.update_form(&defaults.overlaid(overrides), constraints)
    }

    /// Validates a submission against a blank record and projects the result.
    ///
    /// On success the committed record is validated once more with no input,
    /// so rules see it exactly as it would be stored.
    pub fn update_form(&self, raw: &RawInput, constraints: &Constraints) -> FormView {
        let span = form_span(self.schema().name(), "update_form");
        let _guard = span.enter();

        let blank = self.schema().blank_record();
        let outcome: ChangesetResult = self
            .engine
            .apply(&blank, raw, constraints)
            .and_then(|record| self.engine.apply(&record, &RawInput::new(), constraints));

        match outcome {
            Ok(record) => self.project(record, FieldErrors::new(), raw, true),
            Err(rejection) => {
                tracing::debug!(errors = rejection.errors.count(), "form rejected");
                self.project(rejection.record, rejection.errors, raw, false)
            }
        }
    }

    fn project(&self, record: Record, errors: FieldErrors, raw: &RawInput, valid: bool) -> FormView {
        let fields = self
            .schema()
            .fields()
            .iter()
            .map(|spec| FormField {
                name: spec.name.clone(),
                label: spec.label.clone(),
                field_type: spec.field_type.to_string(),
                value: record.value(&spec.name).clone(),
                submitted: raw.get(&spec.name).cloned(),
                errors: errors.get(&spec.name).to_vec(),
            })
            .collect();

        FormView {
            schema: self.schema().name().to_string(),
            fields,
            errors,
            record: valid.then_some(record),
        }
    }
}

/// A Rust type backed by a form schema.
///
/// Implementors provide the shared schema and a decoder from committed
/// records; the changeset and form operations come for free.
///
/// ```
/// use std::sync::{Arc, OnceLock};
/// use typed_forms::prelude::*;
///
/// struct Order {
///     qty: i64,
/// }
///
/// impl FormSchema for Order {
///     fn schema() -> Arc<Schema> {
///         static SCHEMA: OnceLock<Arc<Schema>> = OnceLock::new();
///         SCHEMA
///             .get_or_init(|| {
///                 Arc::new(
///                     Schema::builder("order")
///                         .field(FieldSpec::new("qty", FieldType::Integer).default(1))
///                         .build()
///                         .expect("valid schema"),
///                 )
///             })
///             .clone()
///     }
///
///     fn from_record(record: &Record) -> FormsResult<Self> {
///         Ok(Self { qty: record.require_int("qty")? })
///     }
/// }
///
/// let view = Order::update_form(&RawInput::parse("qty=4"), &Constraints::none());
/// let order = Order::from_view(&view).unwrap().unwrap();
/// assert_eq!(order.qty, 4);
/// ```
pub trait FormSchema: Sized {
    /// The schema shared by every instance of this type.
    fn schema() -> Arc<Schema>;

    /// Decodes a committed record.
    fn from_record(record: &Record) -> FormsResult<Self>;

    fn changeset(existing: &Record, raw: &RawInput, constraints: &Constraints) -> ChangesetResult {
        ChangesetEngine::new(Self::schema()).apply(existing, raw, constraints)
    }

    fn new_form(overrides: &RawInput, constraints: &Constraints) -> FormView {
        TypedForm::new(Self::schema()).new_form(overrides, constraints)
    }

    fn update_form(raw: &RawInput, constraints: &Constraints) -> FormView {
        TypedForm::new(Self::schema()).update_form(raw, constraints)
    }

    /// Decodes the view's committed record; `None` if the view is invalid.
    fn from_view(view: &FormView) -> Option<FormsResult<Self>> {
        view.record().map(Self::from_record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldSpec, FieldType};
    use crate::validators::NumberValidator;

    fn qty_form() -> TypedForm {
        let schema = Schema::builder("order")
            .field(FieldSpec::new("qty", FieldType::Integer).default(1))
            .field(FieldSpec::new("note", FieldType::String))
            .validate(|cs, _| {
                cs.validate_number("qty", NumberValidator::new().greater_than(0.0));
            })
            .build()
            .unwrap();
        TypedForm::new(Arc::new(schema))
    }

    #[test]
    fn test_new_form_uses_defaults() {
        let view = qty_form().new_form(&RawInput::new(), &Constraints::none());
        assert!(view.is_valid());
        assert_eq!(view.value("qty"), Some(&Value::Int(1)));
        assert_eq!(view.value("note"), Some(&Value::Null));
        assert_eq!(view.record().map(|r| r.value("qty")), Some(&Value::Int(1)));
    }

    #[test]
    fn test_new_form_overrides_win() {
        let view = qty_form().new_form(&RawInput::new().with("qty", "4"), &Constraints::none());
        assert_eq!(view.value("qty"), Some(&Value::Int(4)));
    }

    #[test]
    fn test_update_form_rejected_value_shows_prior() {
        let view = qty_form().update_form(&RawInput::new().with("qty", "-5"), &Constraints::none());
        assert!(!view.is_valid());
        assert!(view.record().is_none());
        let qty = view.field("qty").unwrap();
        assert_eq!(qty.value, Value::Int(1));
        assert_eq!(qty.submitted, Some(Value::from("-5")));
        assert_eq!(view.messages("qty"), vec!["must be greater than 0"]);
    }

    #[test]
    fn test_update_form_cast_failure() {
        let view = qty_form().update_form(&RawInput::new().with("qty", "abc"), &Constraints::none());
        assert_eq!(view.value("qty"), Some(&Value::Int(1)));
        assert_eq!(view.messages("qty"), vec!["cannot cast 'abc' to integer"]);
        assert_eq!(view.error_count(), 1);
    }

    #[test]
    fn test_update_form_valid() {
        let view = qty_form().update_form(&RawInput::new().with("qty", "3"), &Constraints::none());
        assert!(view.is_valid());
        assert_eq!(view.value("qty"), Some(&Value::Int(3)));
        assert!(view.field("qty").unwrap().is_valid());
        assert_eq!(view.into_record().unwrap().value("qty"), &Value::Int(3));
    }

    #[test]
    fn test_fields_in_schema_order() {
        let view = qty_form().new_form(&RawInput::new(), &Constraints::none());
        let names: Vec<&str> = view.fields().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["qty", "note"]);
        assert_eq!(view.fields()[0].field_type, "integer");
        assert_eq!(view.schema_name(), "order");
    }

    #[test]
    fn test_to_json() {
        let view = qty_form().update_form(&RawInput::new().with("qty", "0"), &Constraints::none());
        let json = view.to_json();
        assert_eq!(json["valid"], serde_json::json!(false));
        assert_eq!(json["fields"][0]["value"], serde_json::json!(1));
        assert_eq!(json["fields"][0]["submitted"], serde_json::json!("0"));
        assert_eq!(
            json["fields"][0]["errors"],
            serde_json::json!(["must be greater than 0"])
        );
    }
}
