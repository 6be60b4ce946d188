//! Core error types for typed-forms.
//!
//! [`FormsError`] covers the failures that can happen outside of normal
//! validation: malformed schemas, unrecognized constraint shapes, decoding
//! records into concrete types, and configuration loading. Field-level cast
//! and validation failures are not errors in this sense; they are reported
//! as data inside a changeset result.

use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

/// A single validation failure produced by a validator.
///
/// Carries a human-readable message, a short machine-readable code (e.g.
/// `"min_value"`), and optional parameters describing the failure.
///
/// # Examples
///
/// ```
/// use typed_forms_core::error::ValidationError;
///
/// let err = ValidationError::new("must be greater than 0", "greater_than")
///     .with_param("number", "0");
/// assert_eq!(err.to_string(), "must be greater than 0");
/// assert_eq!(err.params.get("number").unwrap(), "0");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// The error message shown to the user.
    pub message: String,
    /// A short code identifying the type of validation failure.
    pub code: String,
    /// Additional parameters providing context for the error message.
    pub params: HashMap<String, String>,
}

impl ValidationError {
    /// Creates a new `ValidationError` with a message and code.
    pub fn new(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: code.into(),
            params: HashMap::new(),
        }
    }

    /// Adds a parameter to this validation error.
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ValidationError {}

/// The primary error type for typed-forms.
#[derive(Error, Debug)]
pub enum FormsError {
    // ── Schema construction ──────────────────────────────────────────

    /// Two fields in one schema share a name.
    #[error("Duplicate field '{field}' in schema '{schema}'")]
    DuplicateField {
        /// The schema being built.
        schema: String,
        /// The repeated field name.
        field: String,
    },

    /// Two validation rules were registered for the same constraint signature.
    #[error("Duplicate validation rule for constraints {signature} in schema '{schema}'")]
    DuplicateValidation {
        /// The schema being built.
        schema: String,
        /// The repeated constraint signature.
        signature: String,
    },

    /// A field name that the schema does not declare.
    #[error("Unknown field '{field}' in schema '{schema}'")]
    UnknownField {
        /// The schema that was consulted.
        schema: String,
        /// The unknown field name.
        field: String,
    },

    /// A declared default value does not cast to its field's type.
    #[error("Invalid default for field '{field}': {reason}")]
    InvalidDefault {
        /// The field whose default is invalid.
        field: String,
        /// Why the default was rejected.
        reason: String,
    },

    // ── Call-time ────────────────────────────────────────────────────

    /// No validation rule is registered for the given constraint keys.
    #[error("Unrecognized constraints {signature} for schema '{schema}'")]
    UnrecognizedConstraints {
        /// The schema that was consulted.
        schema: String,
        /// The constraint signature that matched nothing.
        signature: String,
    },

    /// A record could not be decoded into a concrete type.
    #[error("Decode error: {0}")]
    Decode(String),

    // ── Configuration ────────────────────────────────────────────────

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    // ── IO ───────────────────────────────────────────────────────────

    /// A settings file could not be read.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl FormsError {
    /// Returns `true` for errors raised while building a schema.
    ///
    /// These indicate a programming mistake in the schema definition and are
    /// never produced by validating user input.
    pub const fn is_schema_error(&self) -> bool {
        matches!(
            self,
            Self::DuplicateField { .. }
                | Self::DuplicateValidation { .. }
                | Self::UnknownField { .. }
                | Self::InvalidDefault { .. }
        )
    }
}

/// A convenience type alias for `Result<T, FormsError>`.
pub type FormsResult<T> = Result<T, FormsError>;
