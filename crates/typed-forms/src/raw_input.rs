//! Raw, untyped input submitted by a UI layer.
//!
//! [`RawInput`] maps field names to untyped [`Value`]s, usually strings. It
//! can be built programmatically or parsed from an
//! `application/x-www-form-urlencoded` body.

use std::collections::BTreeMap;

use typed_forms_core::Value;

/// Suffix marking a repeated key that collects into a list (`tags[]=a&tags[]=b`).
const LIST_SUFFIX: &str = "[]";

/// Untyped input for one validation call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawInput {
    params: BTreeMap<String, Value>,
}

impl RawInput {
    /// Creates empty input.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns this input with `field` set to `value`.
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(field.into(), value.into());
        self
    }

    /// Sets `field` to `value`, returning the previous value.
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.params.insert(field.into(), value.into())
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.params.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.params.contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns a copy of `self` with every entry of `overrides` applied on top.
    #[must_use]
    pub fn overlaid(&self, overrides: &Self) -> Self {
        let mut params = self.params.clone();
        for (k, v) in &overrides.params {
            params.insert(k.clone(), v.clone());
        }
        Self { params }
    }

    /// Parses a form-encoded body (e.g. `"qty=3&name=Blue+widget"`).
    ///
    /// Handles percent-encoding and `+` as space. When a plain key repeats,
    /// the last value wins; keys ending in `[]` collect every value into a
    /// [`Value::List`] stored under the key without the suffix.
    ///
    /// # Examples
    ///
    /// ```
    /// use typed_forms::raw_input::RawInput;
    /// use typed_forms::Value;
    ///
    /// let raw = RawInput::parse("qty=3&tags[]=a&tags[]=b%20c");
    /// assert_eq!(raw.get("qty"), Some(&Value::String("3".into())));
    /// assert_eq!(
    ///     raw.get("tags"),
    ///     Some(&Value::List(vec![Value::from("a"), Value::from("b c")]))
    /// );
    /// ```
    pub fn parse(body: &str) -> Self {
        let mut params: BTreeMap<String, Value> = BTreeMap::new();

        for pair in body.split('&') {
            if pair.is_empty() {
                continue;
            }

            let (key, value) = pair
                .find('=')
                .map_or((pair, ""), |eq_pos| (&pair[..eq_pos], &pair[eq_pos + 1..]));

            let key = percent_decode(key);
            let value = Value::String(percent_decode(value));

            if let Some(list_key) = key.strip_suffix(LIST_SUFFIX) {
                match params
                    .entry(list_key.to_string())
                    .or_insert_with(|| Value::List(Vec::new()))
                {
                    Value::List(items) => items.push(value),
                    other => *other = Value::List(vec![value]),
                }
            } else {
                params.insert(key, value);
            }
        }

        Self { params }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for RawInput {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            params: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

fn percent_decode(input: &str) -> String {
    // Replace + with space (form encoding), then decode percent sequences
    let plus_decoded = input.replace('+', " ");
    percent_encoding::percent_decode_str(&plus_decoded)
        .decode_utf8_lossy()
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic() {
        let raw = RawInput::parse("qty=3&name=Blue+widget");
        assert_eq!(raw.len(), 2);
        assert_eq!(raw.get("name"), Some(&Value::String("Blue widget".into())));
    }

    #[test]
    fn test_parse_percent_encoded() {
        let raw = RawInput::parse("email=a%40example.com&note=100%25");
        assert_eq!(raw.get("email"), Some(&Value::from("a@example.com")));
        assert_eq!(raw.get("note"), Some(&Value::from("100%")));
    }

    #[test]
    fn test_parse_repeated_key_last_wins() {
        let raw = RawInput::parse("qty=1&qty=2");
        assert_eq!(raw.get("qty"), Some(&Value::from("2")));
    }

    #[test]
    fn test_parse_list_keys() {
        let raw = RawInput::parse("tags[]=x&other=1&tags[]=y");
        assert_eq!(
            raw.get("tags"),
            Some(&Value::List(vec![Value::from("x"), Value::from("y")]))
        );
    }

    #[test]
    fn test_parse_key_without_value() {
        let raw = RawInput::parse("flag&&qty=");
        assert_eq!(raw.get("flag"), Some(&Value::from("")));
        assert_eq!(raw.get("qty"), Some(&Value::from("")));
    }

    #[test]
    fn test_parse_empty() {
        assert!(RawInput::parse("").is_empty());
    }

    #[test]
    fn test_overlaid_prefers_overrides() {
        let base = RawInput::new().with("qty", 1).with("name", "a");
        let over = RawInput::new().with("qty", 5);
        let merged = base.overlaid(&over);
        assert_eq!(merged.get("qty"), Some(&Value::Int(5)));
        assert_eq!(merged.get("name"), Some(&Value::from("a")));
    }
}
