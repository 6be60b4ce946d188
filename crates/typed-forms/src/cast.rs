//! Casting raw input to a field's declared type.
//!
//! Each [`FieldType`] has one fixed casting rule. Raw strings are
//! normalized first according to [`FormSettings`] (whitespace trimming and
//! configured empty values), numeric parsing is locale-independent, and
//! booleans accept only the configured literals. Already-typed values of the
//! right type pass through unchanged.

use std::fmt;

use typed_forms_core::{FormSettings, Value};

use crate::schema::FieldType;

/// A raw value that could not be converted to a field type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CastError {
    /// The rejected raw value, as shown to the user.
    pub raw: String,
    /// The name of the target type.
    pub type_name: String,
}

impl CastError {
    fn new(raw: &Value, field_type: &FieldType) -> Self {
        Self {
            raw: raw.to_string(),
            type_name: field_type.to_string(),
        }
    }
}

impl fmt::Display for CastError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot cast '{}' to {}", self.raw, self.type_name)
    }
}

impl std::error::Error for CastError {}

/// Casts `raw` to `field_type`.
///
/// `Null` and configured empty strings cast to `Null` for every type.
///
/// # Examples
///
/// ```
/// use typed_forms::cast::cast;
/// use typed_forms::schema::FieldType;
/// use typed_forms::{FormSettings, Value};
///
/// let settings = FormSettings::default();
/// assert_eq!(cast(&FieldType::Integer, &Value::from(" 42 "), &settings), Ok(Value::Int(42)));
/// let err = cast(&FieldType::Integer, &Value::from("abc"), &settings).unwrap_err();
/// assert_eq!(err.to_string(), "cannot cast 'abc' to integer");
/// ```
#[allow(clippy::cast_precision_loss)]
pub fn cast(field_type: &FieldType, raw: &Value, settings: &FormSettings) -> Result<Value, CastError> {
    let normalized;
    let raw = match raw {
        Value::String(s) => {
            let s = if settings.trim_whitespace { s.trim() } else { s.as_str() };
            if settings.is_empty_value(s) {
                return Ok(Value::Null);
            }
            normalized = Value::String(s.to_string());
            &normalized
        }
        Value::Null => return Ok(Value::Null),
        other => other,
    };

    let fail = || CastError::new(raw, field_type);

    match (field_type, raw) {
        (FieldType::Integer, Value::Int(i)) => Ok(Value::Int(*i)),
        (FieldType::Integer, Value::String(s)) => s.parse::<i64>().map(Value::Int).map_err(|_| fail()),

        (FieldType::Float, Value::Float(f)) if f.is_finite() => Ok(Value::Float(*f)),
        (FieldType::Float, Value::Int(i)) => Ok(Value::Float(*i as f64)),
        (FieldType::Float, Value::String(s)) => s
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(Value::Float)
            .ok_or_else(fail),

        (FieldType::Boolean, Value::Bool(b)) => Ok(Value::Bool(*b)),
        (FieldType::Boolean, Value::String(s)) => {
            settings.parse_bool(s).map(Value::Bool).ok_or_else(fail)
        }

        (FieldType::String, Value::String(s)) => Ok(Value::String(s.clone())),

        (FieldType::Date, Value::Date(d)) => Ok(Value::Date(*d)),
        (FieldType::Date, Value::String(s)) => chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Value::Date)
            .map_err(|_| fail()),

        (FieldType::DateTime, Value::DateTime(dt)) => Ok(Value::DateTime(*dt)),
        (FieldType::DateTime, Value::String(s)) => {
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
                .or_else(|_| chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M"))
                .or_else(|_| chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S"))
                .or_else(|_| chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M"))
                .map(Value::DateTime)
                .map_err(|_| fail())
        }

        (FieldType::Time, Value::Time(t)) => Ok(Value::Time(*t)),
        (FieldType::Time, Value::String(s)) => chrono::NaiveTime::parse_from_str(s, "%H:%M:%S")
            .or_else(|_| chrono::NaiveTime::parse_from_str(s, "%H:%M"))
            .map(Value::Time)
            .map_err(|_| fail()),

        (FieldType::Uuid, Value::Uuid(u)) => Ok(Value::Uuid(*u)),
        (FieldType::Uuid, Value::String(s)) => {
            uuid::Uuid::parse_str(s).map(Value::Uuid).map_err(|_| fail())
        }

        (FieldType::Json, Value::String(s)) => serde_json::from_str::<serde_json::Value>(s)
            .map(Value::Json)
            .map_err(|_| fail()),
        (FieldType::Json, other) => Ok(Value::Json(other.to_json())),

        (FieldType::Array(inner), Value::List(items)) => items
            .iter()
            .map(|item| cast(inner, item, settings))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List)
            .map_err(|_| fail()),

        _ => Err(fail()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s() -> FormSettings {
        FormSettings::default()
    }

    #[test]
    fn test_integer_from_string() {
        assert_eq!(cast(&FieldType::Integer, &Value::from("-5"), &s()), Ok(Value::Int(-5)));
        assert_eq!(cast(&FieldType::Integer, &Value::from("+7"), &s()), Ok(Value::Int(7)));
    }

    #[test]
    fn test_integer_rejects_decimal_and_words() {
        assert!(cast(&FieldType::Integer, &Value::from("1.5"), &s()).is_err());
        assert!(cast(&FieldType::Integer, &Value::from("1,000"), &s()).is_err());
        assert!(cast(&FieldType::Integer, &Value::Float(2.0), &s()).is_err());
        assert!(cast(&FieldType::Integer, &Value::Bool(true), &s()).is_err());
    }

    #[test]
    fn test_cast_error_message() {
        let err = cast(&FieldType::Integer, &Value::from("abc"), &s()).unwrap_err();
        assert_eq!(err.to_string(), "cannot cast 'abc' to integer");
    }

    #[test]
    fn test_empty_string_is_null() {
        assert_eq!(cast(&FieldType::Integer, &Value::from(""), &s()), Ok(Value::Null));
        assert_eq!(cast(&FieldType::String, &Value::from("   "), &s()), Ok(Value::Null));
        assert_eq!(cast(&FieldType::Boolean, &Value::Null, &s()), Ok(Value::Null));
    }

    #[test]
    fn test_trim_disabled_keeps_whitespace() {
        let settings = FormSettings {
            trim_whitespace: false,
            ..FormSettings::default()
        };
        assert_eq!(
            cast(&FieldType::String, &Value::from(" a "), &settings),
            Ok(Value::from(" a "))
        );
        assert!(cast(&FieldType::Integer, &Value::from(" 4"), &settings).is_err());
    }

    #[test]
    fn test_float_is_locale_independent() {
        assert_eq!(cast(&FieldType::Float, &Value::from("2.5"), &s()), Ok(Value::Float(2.5)));
        assert!(cast(&FieldType::Float, &Value::from("2,5"), &s()).is_err());
        assert_eq!(cast(&FieldType::Float, &Value::Int(3), &s()), Ok(Value::Float(3.0)));
    }

    #[test]
    fn test_float_rejects_non_finite() {
        assert!(cast(&FieldType::Float, &Value::from("NaN"), &s()).is_err());
        assert!(cast(&FieldType::Float, &Value::from("inf"), &s()).is_err());
        assert!(cast(&FieldType::Float, &Value::Float(f64::INFINITY), &s()).is_err());
    }

    #[test]
    fn test_boolean_literals() {
        assert_eq!(cast(&FieldType::Boolean, &Value::from("true"), &s()), Ok(Value::Bool(true)));
        assert_eq!(cast(&FieldType::Boolean, &Value::from("0"), &s()), Ok(Value::Bool(false)));
        assert!(cast(&FieldType::Boolean, &Value::from("maybe"), &s()).is_err());
    }

    #[test]
    fn test_string_rejects_non_strings() {
        assert_eq!(cast(&FieldType::String, &Value::from("x"), &s()), Ok(Value::from("x")));
        let err = cast(&FieldType::String, &Value::Int(3), &s()).unwrap_err();
        assert_eq!(err.to_string(), "cannot cast '3' to string");
    }

    #[test]
    fn test_date_time_types() {
        let d = chrono::NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(cast(&FieldType::Date, &Value::from("2024-02-29"), &s()), Ok(Value::Date(d)));
        assert!(cast(&FieldType::Date, &Value::from("2023-02-29"), &s()).is_err());

        let dt = d.and_hms_opt(9, 30, 0).unwrap();
        assert_eq!(
            cast(&FieldType::DateTime, &Value::from("2024-02-29T09:30"), &s()),
            Ok(Value::DateTime(dt))
        );

        let t = chrono::NaiveTime::from_hms_opt(14, 5, 0).unwrap();
        assert_eq!(cast(&FieldType::Time, &Value::from("14:05"), &s()), Ok(Value::Time(t)));
    }

    #[test]
    fn test_uuid() {
        let u = uuid::Uuid::nil();
        assert_eq!(cast(&FieldType::Uuid, &Value::from(u.to_string()), &s()), Ok(Value::Uuid(u)));
        assert!(cast(&FieldType::Uuid, &Value::from("not-a-uuid"), &s()).is_err());
    }

    #[test]
    fn test_json() {
        assert_eq!(
            cast(&FieldType::Json, &Value::from(r#"{"a": 1}"#), &s()),
            Ok(Value::Json(serde_json::json!({"a": 1})))
        );
        assert_eq!(
            cast(&FieldType::Json, &Value::Int(4), &s()),
            Ok(Value::Json(serde_json::json!(4)))
        );
        assert!(cast(&FieldType::Json, &Value::from("{oops"), &s()).is_err());
    }

    #[test]
    fn test_array() {
        let ty = FieldType::Array(Box::new(FieldType::Integer));
        let raw = Value::List(vec![Value::from("1"), Value::from("2")]);
        assert_eq!(
            cast(&ty, &raw, &s()),
            Ok(Value::List(vec![Value::Int(1), Value::Int(2)]))
        );

        let bad = Value::List(vec![Value::from("1"), Value::from("x")]);
        let err = cast(&ty, &bad, &s()).unwrap_err();
        assert_eq!(err.to_string(), "cannot cast '[1, x]' to array of integer");

        assert!(cast(&ty, &Value::from("1,2"), &s()).is_err());
    }
}
