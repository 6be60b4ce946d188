//! Field validators used by validation rules.
//!
//! Validators check one constraint on an already cast value and return a
//! [`ValidationError`] when it does not hold. Rules usually apply them
//! through [`Changeset::validate_with`](crate::changeset::Changeset::validate_with)
//! and friends, which skip null values and fields that failed to cast.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use typed_forms_core::{ValidationError, Value};

/// A trait for validating cast field values.
///
/// # Examples
///
/// ```
/// use typed_forms::validators::{MaxLengthValidator, Validator};
/// use typed_forms::Value;
///
/// let v = MaxLengthValidator::new(5);
/// assert!(v.validate(&Value::from("hi")).is_ok());
/// assert!(v.validate(&Value::from("toolong")).is_err());
/// ```
pub trait Validator: Send + Sync + fmt::Debug {
    /// Validates the given value, returning an error if invalid.
    fn validate(&self, value: &Value) -> Result<(), ValidationError>;

    /// Returns a human-readable name for this validator.
    fn name(&self) -> &str;
}

fn char_len(value: &Value) -> Option<usize> {
    match value {
        Value::String(s) => Some(s.chars().count()),
        Value::List(items) => Some(items.len()),
        _ => None,
    }
}

/// Validates that a string (or list) does not exceed a maximum length.
#[derive(Debug, Clone)]
pub struct MaxLengthValidator {
    /// The maximum allowed length.
    pub max_length: usize,
}

impl MaxLengthValidator {
    pub const fn new(max_length: usize) -> Self {
        Self { max_length }
    }
}

impl Validator for MaxLengthValidator {
    fn validate(&self, value: &Value) -> Result<(), ValidationError> {
        match char_len(value) {
            Some(len) if len > self.max_length => Err(ValidationError::new(
                format!(
                    "Ensure this value has at most {} characters (it has {len}).",
                    self.max_length
                ),
                "max_length",
            )
            .with_param("count", self.max_length.to_string())),
            _ => Ok(()),
        }
    }

    fn name(&self) -> &str {
        "MaxLengthValidator"
    }
}

/// Validates that a string (or list) meets a minimum length.
#[derive(Debug, Clone)]
pub struct MinLengthValidator {
    /// The minimum required length.
    pub min_length: usize,
}

impl MinLengthValidator {
    pub const fn new(min_length: usize) -> Self {
        Self { min_length }
    }
}

impl Validator for MinLengthValidator {
    fn validate(&self, value: &Value) -> Result<(), ValidationError> {
        match char_len(value) {
            Some(len) if len < self.min_length => Err(ValidationError::new(
                format!(
                    "Ensure this value has at least {} characters (it has {len}).",
                    self.min_length
                ),
                "min_length",
            )
            .with_param("count", self.min_length.to_string())),
            _ => Ok(()),
        }
    }

    fn name(&self) -> &str {
        "MinLengthValidator"
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Comparison {
    GreaterThan(f64),
    GreaterThanOrEqualTo(f64),
    LessThan(f64),
    LessThanOrEqualTo(f64),
    EqualTo(f64),
}

impl Comparison {
    #[allow(clippy::float_cmp)]
    fn holds(self, n: f64) -> bool {
        match self {
            Self::GreaterThan(bound) => n > bound,
            Self::GreaterThanOrEqualTo(bound) => n >= bound,
            Self::LessThan(bound) => n < bound,
            Self::LessThanOrEqualTo(bound) => n <= bound,
            Self::EqualTo(bound) => n == bound,
        }
    }

    fn error(self) -> ValidationError {
        let (phrase, code, bound) = match self {
            Self::GreaterThan(b) => ("greater than", "greater_than", b),
            Self::GreaterThanOrEqualTo(b) => {
                ("greater than or equal to", "greater_than_or_equal_to", b)
            }
            Self::LessThan(b) => ("less than", "less_than", b),
            Self::LessThanOrEqualTo(b) => ("less than or equal to", "less_than_or_equal_to", b),
            Self::EqualTo(b) => ("equal to", "equal_to", b),
        };
        ValidationError::new(format!("must be {phrase} {bound}"), code)
            .with_param("number", bound.to_string())
    }
}

/// Validates a number against one or more comparisons.
///
/// Comparisons are checked in the order they were added and only the first
/// failing one is reported. Bounds print without a trailing `.0`.
///
/// ```
/// use typed_forms::validators::{NumberValidator, Validator};
/// use typed_forms::Value;
///
/// let v = NumberValidator::new().greater_than(0.0).less_than_or_equal_to(3.0);
/// assert!(v.validate(&Value::Int(2)).is_ok());
/// assert_eq!(v.validate(&Value::Int(0)).unwrap_err().message, "must be greater than 0");
/// assert_eq!(
///     v.validate(&Value::Int(5)).unwrap_err().message,
///     "must be less than or equal to 3"
/// );
/// ```
#[derive(Debug, Clone, Default)]
pub struct NumberValidator {
    comparisons: Vec<Comparison>,
}

impl NumberValidator {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn greater_than(mut self, bound: f64) -> Self {
        self.comparisons.push(Comparison::GreaterThan(bound));
        self
    }

    #[must_use]
    pub fn greater_than_or_equal_to(mut self, bound: f64) -> Self {
        self.comparisons.push(Comparison::GreaterThanOrEqualTo(bound));
        self
    }

    #[must_use]
    pub fn less_than(mut self, bound: f64) -> Self {
        self.comparisons.push(Comparison::LessThan(bound));
        self
    }

    #[must_use]
    pub fn less_than_or_equal_to(mut self, bound: f64) -> Self {
        self.comparisons.push(Comparison::LessThanOrEqualTo(bound));
        self
    }

    #[must_use]
    pub fn equal_to(mut self, bound: f64) -> Self {
        self.comparisons.push(Comparison::EqualTo(bound));
        self
    }
}

impl Validator for NumberValidator {
    fn validate(&self, value: &Value) -> Result<(), ValidationError> {
        let Some(n) = value.as_number() else {
            return Ok(());
        };
        match self.comparisons.iter().find(|c| !c.holds(n)) {
            Some(failed) => Err(failed.error()),
            None => Ok(()),
        }
    }

    fn name(&self) -> &str {
        "NumberValidator"
    }
}

/// Validates that a value is one of a fixed set.
#[derive(Debug, Clone)]
pub struct InclusionValidator {
    /// The allowed values.
    pub allowed: Vec<Value>,
}

impl InclusionValidator {
    pub fn new<I, V>(allowed: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self {
            allowed: allowed.into_iter().map(Into::into).collect(),
        }
    }
}

impl Validator for InclusionValidator {
    fn validate(&self, value: &Value) -> Result<(), ValidationError> {
        if self.allowed.contains(value) {
            Ok(())
        } else {
            Err(ValidationError::new("is invalid", "inclusion"))
        }
    }

    fn name(&self) -> &str {
        "InclusionValidator"
    }
}

/// Validates that a string matches a regular expression.
#[derive(Debug, Clone)]
pub struct FormatValidator {
    regex: Regex,
}

impl FormatValidator {
    /// Compiles `pattern` into a validator.
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Regex::new(pattern).map(Self::from_regex)
    }

    pub const fn from_regex(regex: Regex) -> Self {
        Self { regex }
    }
}

impl Validator for FormatValidator {
    fn validate(&self, value: &Value) -> Result<(), ValidationError> {
        match value {
            Value::String(s) if !self.regex.is_match(s) => {
                Err(ValidationError::new("has invalid format", "format"))
            }
            _ => Ok(()),
        }
    }

    fn name(&self) -> &str {
        "FormatValidator"
    }
}

/// Validates that a string looks like an email address.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmailValidator;

impl Validator for EmailValidator {
    fn validate(&self, value: &Value) -> Result<(), ValidationError> {
        static EMAIL_RE: OnceLock<Regex> = OnceLock::new();
        let email_re = EMAIL_RE.get_or_init(|| {
            Regex::new(r"^[a-zA-Z0-9._%+\-]+@[a-zA-Z0-9.\-]+\.[a-zA-Z]{2,}$").expect("valid regex")
        });

        match value {
            Value::String(s) if !email_re.is_match(s) => {
                Err(ValidationError::new("Enter a valid email address.", "invalid_email"))
            }
            _ => Ok(()),
        }
    }

    fn name(&self) -> &str {
        "EmailValidator"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_length() {
        let v = MaxLengthValidator::new(5);
        assert!(v.validate(&Value::from("hello")).is_ok());
        let err = v.validate(&Value::from("hello!")).unwrap_err();
        assert_eq!(err.code, "max_length");
        assert_eq!(
            err.message,
            "Ensure this value has at most 5 characters (it has 6)."
        );
    }

    #[test]
    fn test_length_counts_chars_not_bytes() {
        let v = MaxLengthValidator::new(3);
        assert!(v.validate(&Value::from("héé")).is_ok());
    }

    #[test]
    fn test_min_length() {
        let v = MinLengthValidator::new(2);
        assert!(v.validate(&Value::from("ab")).is_ok());
        assert_eq!(v.validate(&Value::from("a")).unwrap_err().code, "min_length");
        assert!(v
            .validate(&Value::List(vec![Value::Int(1)]))
            .is_err());
    }

    #[test]
    fn test_length_ignores_non_strings() {
        assert!(MaxLengthValidator::new(0).validate(&Value::Int(12345)).is_ok());
    }

    #[test]
    fn test_number_greater_than() {
        let v = NumberValidator::new().greater_than(0.0);
        assert!(v.validate(&Value::Int(1)).is_ok());
        let err = v.validate(&Value::Int(-5)).unwrap_err();
        assert_eq!(err.message, "must be greater than 0");
        assert_eq!(err.code, "greater_than");
        assert_eq!(err.params.get("number").map(String::as_str), Some("0"));
    }

    #[test]
    fn test_number_reports_first_failure() {
        let v = NumberValidator::new().greater_than(10.0).less_than(5.0);
        let err = v.validate(&Value::Int(7)).unwrap_err();
        assert_eq!(err.message, "must be greater than 10");
    }

    #[test]
    fn test_number_fractional_bound() {
        let v = NumberValidator::new().less_than(2.5);
        assert_eq!(
            v.validate(&Value::Float(3.0)).unwrap_err().message,
            "must be less than 2.5"
        );
    }

    #[test]
    fn test_number_equal_to() {
        let v = NumberValidator::new().equal_to(3.0);
        assert!(v.validate(&Value::Int(3)).is_ok());
        assert_eq!(v.validate(&Value::Int(4)).unwrap_err().message, "must be equal to 3");
    }

    #[test]
    fn test_inclusion() {
        let v = InclusionValidator::new(["small", "large"]);
        assert!(v.validate(&Value::from("small")).is_ok());
        assert_eq!(v.validate(&Value::from("huge")).unwrap_err().message, "is invalid");
    }

    #[test]
    fn test_format() {
        let v = FormatValidator::new(r"^[A-Z]{3}-\d+$").unwrap();
        assert!(v.validate(&Value::from("SKU-12")).is_ok());
        assert_eq!(v.validate(&Value::from("sku")).unwrap_err().code, "format");
        assert!(FormatValidator::new("(").is_err());
    }

    #[test]
    fn test_email() {
        let v = EmailValidator;
        assert!(v.validate(&Value::from("user@example.com")).is_ok());
        assert!(v.validate(&Value::from("not-an-email")).is_err());
        assert_eq!(v.name(), "EmailValidator");
    }
}
