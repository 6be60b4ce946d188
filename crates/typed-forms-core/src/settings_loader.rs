//! Settings loading from configuration files.
//!
//! This module loads [`FormSettings`] from TOML or JSON and applies
//! environment variable overrides.
//!
//! ## Loading Order
//!
//! 1. Start with default settings.
//! 2. Load from a TOML or JSON file (overriding defaults).
//! 3. Apply environment variable overrides (highest priority).
//!
//! ## Environment Variable Mapping
//!
//! | Env Var | Setting |
//! |---|---|
//! | `TYPED_FORMS_DEBUG` | `debug` |
//! | `TYPED_FORMS_LOG_LEVEL` | `log_level` |
//! | `TYPED_FORMS_TRIM_WHITESPACE` | `trim_whitespace` |
//! | `TYPED_FORMS_EMPTY_VALUES` | `empty_values` (comma-separated) |
//! | `TYPED_FORMS_TRUE_LITERALS` | `true_literals` (comma-separated) |
//! | `TYPED_FORMS_FALSE_LITERALS` | `false_literals` (comma-separated) |
//!
//! ## Examples
//!
//! ```rust,no_run
//! use typed_forms_core::settings_loader;
//!
//! let settings = settings_loader::from_toml_file("config/forms.toml").unwrap();
//! let settings = settings_loader::from_toml_file_with_env("config/forms.toml").unwrap();
//! ```

use std::path::Path;

use crate::error::FormsError;
use crate::settings::FormSettings;

/// Loads settings from a TOML string.
///
/// Any settings not present in the TOML keep their default values.
pub fn from_toml_str(toml_str: &str) -> Result<FormSettings, FormsError> {
    // Round-trip through JSON so partial documents merge over the defaults.
    let toml_value: toml::Value = toml::from_str(toml_str)
        .map_err(|e| FormsError::ConfigurationError(format!("Failed to parse TOML: {e}")))?;

    let json_value = toml_to_json(toml_value);
    merge_over_defaults(json_value, "TOML")
}

/// Loads settings from a TOML file.
pub fn from_toml_file(path: impl AsRef<Path>) -> Result<FormSettings, FormsError> {
    let content = std::fs::read_to_string(path)?;
    from_toml_str(&content)
}

/// Loads settings from a TOML file and then applies environment variable overrides.
pub fn from_toml_file_with_env(path: impl AsRef<Path>) -> Result<FormSettings, FormsError> {
    let mut settings = from_toml_file(path)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Loads settings from a JSON string.
pub fn from_json_str(json_str: &str) -> Result<FormSettings, FormsError> {
    let json_value: serde_json::Value = serde_json::from_str(json_str)
        .map_err(|e| FormsError::ConfigurationError(format!("Failed to parse JSON: {e}")))?;
    merge_over_defaults(json_value, "JSON")
}

/// Loads settings from a JSON file.
pub fn from_json_file(path: impl AsRef<Path>) -> Result<FormSettings, FormsError> {
    let content = std::fs::read_to_string(path)?;
    from_json_str(&content)
}

/// Loads settings from just environment variables (starting from defaults).
pub fn from_env() -> FormSettings {
    let mut settings = FormSettings::default();
    apply_env_overrides(&mut settings);
    settings
}

/// Applies `TYPED_FORMS_*` environment variable overrides to a settings struct.
///
/// Boolean variables accept "true"/"1"/"yes" as true; anything else is false.
/// List variables are comma-separated and keep empty entries, so
/// `TYPED_FORMS_EMPTY_VALUES=",n/a"` yields `["", "n/a"]`.
pub fn apply_env_overrides(settings: &mut FormSettings) {
    if let Ok(val) = std::env::var("TYPED_FORMS_DEBUG") {
        settings.debug = parse_env_bool(&val);
    }

    if let Ok(val) = std::env::var("TYPED_FORMS_LOG_LEVEL") {
        settings.log_level = val;
    }

    if let Ok(val) = std::env::var("TYPED_FORMS_TRIM_WHITESPACE") {
        settings.trim_whitespace = parse_env_bool(&val);
    }

    if let Ok(val) = std::env::var("TYPED_FORMS_EMPTY_VALUES") {
        settings.empty_values = split_list(&val);
    }

    if let Ok(val) = std::env::var("TYPED_FORMS_TRUE_LITERALS") {
        settings.true_literals = split_list(&val);
    }

    if let Ok(val) = std::env::var("TYPED_FORMS_FALSE_LITERALS") {
        settings.false_literals = split_list(&val);
    }
}

// ============================================================
// Helpers
// ============================================================

fn parse_env_bool(val: &str) -> bool {
    matches!(val.to_lowercase().as_str(), "true" | "1" | "yes")
}

fn split_list(val: &str) -> Vec<String> {
    val.split(',').map(|s| s.trim().to_string()).collect()
}

fn merge_over_defaults(
    value: serde_json::Value,
    format: &str,
) -> Result<FormSettings, FormsError> {
    let default_json = serde_json::to_value(FormSettings::default()).map_err(|e| {
        FormsError::ConfigurationError(format!("Failed to serialize default settings: {e}"))
    })?;

    let merged = merge_json(default_json, value);
    serde_json::from_value(merged).map_err(|e| {
        FormsError::ConfigurationError(format!("Failed to deserialize settings from {format}: {e}"))
    })
}

/// Converts a TOML value to a `serde_json::Value`.
fn toml_to_json(value: toml::Value) -> serde_json::Value {
    match value {
        toml::Value::String(s) => serde_json::Value::String(s),
        toml::Value::Integer(i) => serde_json::json!(i),
        toml::Value::Float(f) => serde_json::json!(f),
        toml::Value::Boolean(b) => serde_json::Value::Bool(b),
        toml::Value::Datetime(dt) => serde_json::Value::String(dt.to_string()),
        toml::Value::Array(arr) => {
            serde_json::Value::Array(arr.into_iter().map(toml_to_json).collect())
        }
        toml::Value::Table(table) => {
            let map: serde_json::Map<String, serde_json::Value> = table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect();
            serde_json::Value::Object(map)
        }
    }
}

/// Deep-merges two JSON values. The `override_val` takes precedence.
fn merge_json(base: serde_json::Value, override_val: serde_json::Value) -> serde_json::Value {
    match (base, override_val) {
        (serde_json::Value::Object(mut base_map), serde_json::Value::Object(override_map)) => {
            for (key, override_v) in override_map {
                let merged = if let Some(base_v) = base_map.remove(&key) {
                    merge_json(base_v, override_v)
                } else {
                    override_v
                };
                base_map.insert(key, merged);
            }
            serde_json::Value::Object(base_map)
        }
        (_, override_val) => override_val,
    }
}
