//! # typed-forms
//!
//! Schema-driven typed forms. A [`Schema`](schema::Schema) declares typed
//! fields and defaults; the [`ChangesetEngine`](changeset::ChangesetEngine)
//! casts raw input against it and runs validation rules; a
//! [`TypedForm`](form::TypedForm) projects the result into a renderable
//! [`FormView`](form::FormView) with per-field values and errors.
//!
//! ```
//! use typed_forms::prelude::*;
//!
//! let schema = Schema::builder("order")
//!     .field(FieldSpec::new("qty", FieldType::Integer).default(1))
//!     .validate(|cs, _| {
//!         cs.validate_number("qty", NumberValidator::new().greater_than(0.0));
//!     })
//!     .build()
//!     .unwrap();
//!
//! let form = TypedForm::new(std::sync::Arc::new(schema));
//! let view = form.update_form(&RawInput::new().with("qty", "-5"), &Constraints::none());
//! assert_eq!(view.value("qty"), Some(&Value::Int(1)));
//! assert_eq!(view.messages("qty"), vec!["must be greater than 0"]);
//! ```

pub mod cast;
pub mod changeset;
pub mod constraints;
pub mod form;
pub mod raw_input;
pub mod record;
pub mod schema;
pub mod validators;

pub use typed_forms_core::{FormSettings, FormsError, FormsResult, ValidationError, Value};

/// Commonly used types, re-exported for glob import.
pub mod prelude {
    pub use crate::changeset::{
        Changeset, ChangesetEngine, ChangesetResult, ErrorKind, FieldError, FieldErrors, Rejection,
    };
    pub use crate::constraints::{ConstraintSignature, Constraints, ValidationRule};
    pub use crate::form::{FormField, FormSchema, FormView, TypedForm};
    pub use crate::raw_input::RawInput;
    pub use crate::record::Record;
    pub use crate::schema::{FieldSpec, FieldType, Schema, SchemaBuilder};
    pub use crate::validators::{
        EmailValidator, FormatValidator, InclusionValidator, MaxLengthValidator,
        MinLengthValidator, NumberValidator, Validator,
    };
    pub use typed_forms_core::{FormSettings, FormsError, FormsResult, Value};
}
