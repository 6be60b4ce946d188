//! Casting and logging configuration.
//!
//! [`FormSettings`] controls how raw input is normalized before it is cast
//! and how logging is set up. Settings are passed explicitly to the
//! components that use them; there is no global settings instance, so two
//! engines configured differently can run side by side.

use serde::{Deserialize, Serialize};

/// The complete set of typed-forms settings.
///
/// # Examples
///
/// ```
/// use typed_forms_core::settings::FormSettings;
///
/// let settings = FormSettings::default();
/// assert!(settings.trim_whitespace);
/// assert_eq!(settings.empty_values, vec![String::new()]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormSettings {
    // ── Logging ──────────────────────────────────────────────────────

    /// Whether debug mode is enabled (pretty logs instead of JSON).
    pub debug: bool,
    /// The log level filter (e.g. "info", "debug", "`typed_forms=trace`").
    pub log_level: String,

    // ── Casting ──────────────────────────────────────────────────────

    /// Whether to trim leading/trailing whitespace from string input
    /// before casting.
    pub trim_whitespace: bool,
    /// Raw strings that are treated as "no value" and cast to null.
    pub empty_values: Vec<String>,
    /// Raw strings accepted as `true` by boolean fields (case-insensitive).
    pub true_literals: Vec<String>,
    /// Raw strings accepted as `false` by boolean fields (case-insensitive).
    pub false_literals: Vec<String>,
}

impl Default for FormSettings {
    fn default() -> Self {
        Self {
            debug: true,
            log_level: "info".to_string(),
            trim_whitespace: true,
            empty_values: vec![String::new()],
            true_literals: vec!["true".to_string(), "1".to_string()],
            false_literals: vec!["false".to_string(), "0".to_string()],
        }
    }
}

impl FormSettings {
    /// Returns `true` if `raw` is configured as an empty value.
    pub fn is_empty_value(&self, raw: &str) -> bool {
        self.empty_values.iter().any(|e| e == raw)
    }

    /// Parses a boolean literal using the configured true/false literals.
    pub fn parse_bool(&self, raw: &str) -> Option<bool> {
        if self.true_literals.iter().any(|l| l.eq_ignore_ascii_case(raw)) {
            Some(true)
        } else if self.false_literals.iter().any(|l| l.eq_ignore_ascii_case(raw)) {
            Some(false)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let s = FormSettings::default();
        assert!(s.debug);
        assert_eq!(s.log_level, "info");
        assert!(s.trim_whitespace);
        assert!(s.is_empty_value(""));
        assert!(!s.is_empty_value(" "));
    }

    #[test]
    fn test_parse_bool_defaults() {
        let s = FormSettings::default();
        assert_eq!(s.parse_bool("true"), Some(true));
        assert_eq!(s.parse_bool("TRUE"), Some(true));
        assert_eq!(s.parse_bool("1"), Some(true));
        assert_eq!(s.parse_bool("false"), Some(false));
        assert_eq!(s.parse_bool("0"), Some(false));
        assert_eq!(s.parse_bool("on"), None);
    }

    #[test]
    fn test_parse_bool_custom_literals() {
        let s = FormSettings {
            true_literals: vec!["on".into()],
            false_literals: vec!["off".into()],
            ..FormSettings::default()
        };
        assert_eq!(s.parse_bool("on"), Some(true));
        assert_eq!(s.parse_bool("Off"), Some(false));
        assert_eq!(s.parse_bool("true"), None);
    }
}
