//! Store configuration.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Which callbacks the filter language may invoke.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllowedCallbacks {
    /// No callback may run.
    #[default]
    Disabled,
    /// Every registered callback may run.
    Any,
    /// Only callbacks named here, by bare name, type name or `Type::method`.
    Only(Vec<String>),
}

impl AllowedCallbacks {
    /// Whether any of `names` appears in the allow-list.
    pub fn permits<'a>(&self, mut names: impl Iterator<Item = &'a str>) -> bool {
        match self {
            Self::Disabled => false,
            Self::Any => true,
            Self::Only(list) => names.any(|name| list.iter().any(|allowed| allowed == name)),
        }
    }
}

/// Behaviour switches shared by every read and write of one store.
///
/// # Defaults
///
/// - `throw_on_empty`: `true`
/// - `default_value`: `false`
/// - `return_by_reference`: `true`
/// - `allowed_callbacks`: [`AllowedCallbacks::Disabled`]
/// - `parameter_quote_char`: `'`
/// - `filter_always_returns_array`: `false`
/// - `case_sensitive_keys`: `false`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Absent paths and empty query results are errors rather than
    /// [`Config::default_value`].
    pub throw_on_empty: bool,
    /// Value returned for absent results when `throw_on_empty` is off.
    pub default_value: Value,
    /// Reads alias the tree; when off, reads return detached copies.
    pub return_by_reference: bool,
    pub allowed_callbacks: AllowedCallbacks,
    /// Quote character for callback argument lists.
    pub parameter_quote_char: char,
    /// Filters always produce a sequence, possibly empty.
    pub filter_always_returns_array: bool,
    /// Predicate keys compare case-sensitively.
    pub case_sensitive_keys: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            throw_on_empty: true,
            default_value: Value::Bool(false),
            return_by_reference: true,
            allowed_callbacks: AllowedCallbacks::Disabled,
            parameter_quote_char: '\'',
            filter_always_returns_array: false,
            case_sensitive_keys: false,
        }
    }
}

impl Config {
    #[must_use]
    pub fn with_throw_on_empty(mut self, throw_on_empty: bool) -> Self {
        self.throw_on_empty = throw_on_empty;
        self
    }

    #[must_use]
    pub fn with_default_value(mut self, default_value: Value) -> Self {
        self.default_value = default_value;
        self
    }

    #[must_use]
    pub fn with_return_by_reference(mut self, return_by_reference: bool) -> Self {
        self.return_by_reference = return_by_reference;
        self
    }

    #[must_use]
    pub fn with_allowed_callbacks(mut self, allowed_callbacks: AllowedCallbacks) -> Self {
        self.allowed_callbacks = allowed_callbacks;
        self
    }

    #[must_use]
    pub fn with_parameter_quote_char(mut self, quote: char) -> Self {
        self.parameter_quote_char = quote;
        self
    }

    #[must_use]
    pub fn with_filter_always_returns_array(mut self, always: bool) -> Self {
        self.filter_always_returns_array = always;
        self
    }

    #[must_use]
    pub fn with_case_sensitive_keys(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive_keys = case_sensitive;
        self
    }

    /// Compares a predicate key with a member key under the configured case rule.
    pub(crate) fn keys_match(&self, wanted: &str, actual: &str) -> bool {
        if self.case_sensitive_keys {
            wanted == actual
        } else {
            wanted.to_lowercase() == actual.to_lowercase()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert!(config.throw_on_empty);
        assert_eq!(config.default_value, json!(false));
        assert!(config.return_by_reference);
        assert_eq!(config.allowed_callbacks, AllowedCallbacks::Disabled);
        assert_eq!(config.parameter_quote_char, '\'');
    }

    #[test]
    fn deserializes_partial_json() {
        let config: Config = serde_json::from_value(json!({
            "throw_on_empty": false,
            "default_value": null,
            "allowed_callbacks": {"only": ["strtoupper", "Report::total"]}
        }))
        .unwrap();
        assert!(!config.throw_on_empty);
        assert_eq!(config.default_value, json!(null));
        assert!(config.return_by_reference);
        assert!(config
            .allowed_callbacks
            .permits(["Report", "Report::total"].into_iter()));
        assert!(!config.allowed_callbacks.permits(["count"].into_iter()));
    }

    #[test]
    fn key_case_rule() {
        let config = Config::default();
        assert!(config.keys_match("Price", "price"));
        let strict = config.with_case_sensitive_keys(true);
        assert!(!strict.keys_match("Price", "price"));
    }
}
