//! # Registry Configuration
//!
//! Attribute names discovery reads from hosts, plus per-path default
//! options merged underneath whatever a host declares.
//!
//! ```json
//! {
//!   "module_attribute": "data-module",
//!   "default_options": { "ui/menu": { "collapsed": true } }
//! }
//! ```
//!
//! Missing fields fall back to their defaults.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared_types::attributes;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Holds the candidate path or a JSON array of candidates.
    pub module_attribute: String,
    /// Condition set for a single-path declaration.
    pub conditions_attribute: String,
    /// Integer node priority, higher initializes first.
    pub priority_attribute: String,
    /// Set on hosts that already have a node.
    pub processed_attribute: String,
    /// Path → options object.
    pub default_options: BTreeMap<String, Value>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            module_attribute: attributes::MODULE.to_owned(),
            conditions_attribute: attributes::CONDITIONS.to_owned(),
            priority_attribute: attributes::PRIORITY.to_owned(),
            processed_attribute: attributes::PROCESSED.to_owned(),
            default_options: BTreeMap::new(),
        }
    }
}

impl RegistryConfig {
    /// Parse and validate a JSON document.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` for malformed JSON, otherwise whatever
    /// [`RegistryConfig::validate`] reports.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check attribute names are set and distinct, and default options are objects.
    ///
    /// # Errors
    ///
    /// Returns the first violation found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let names = [
            ("module_attribute", &self.module_attribute),
            ("conditions_attribute", &self.conditions_attribute),
            ("priority_attribute", &self.priority_attribute),
            ("processed_attribute", &self.processed_attribute),
        ];

        for (field, name) in names {
            if name.trim().is_empty() {
                return Err(ConfigError::EmptyAttribute { field });
            }
        }
        for (i, (first, a)) in names.iter().enumerate() {
            if let Some((second, _)) = names[i + 1..].iter().find(|(_, b)| a == b) {
                return Err(ConfigError::DuplicateAttribute {
                    first: *first,
                    second: *second,
                    name: (*a).clone(),
                });
            }
        }

        if let Some((path, _)) = self.default_options.iter().find(|(_, v)| !v.is_object()) {
            return Err(ConfigError::InvalidDefaultOptions { path: path.clone() });
        }
        Ok(())
    }

    /// Merge the default options for `path` underneath `declared`.
    ///
    /// Declared keys win. Non-object declared options replace the defaults.
    pub fn options_for(&self, path: &str, declared: Value) -> Value {
        let Some(Value::Object(defaults)) = self.default_options.get(path) else {
            return declared;
        };
        match declared {
            Value::Null => Value::Object(defaults.clone()),
            Value::Object(declared) => {
                let mut merged = defaults.clone();
                merged.extend(declared);
                Value::Object(merged)
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let config = RegistryConfig::default();
        assert_eq!(config.module_attribute, "data-module");
        assert_eq!(config.processed_attribute, "data-processed");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = RegistryConfig::from_json(
            r#"{"module_attribute": "data-behavior", "default_options": {"ui/menu": {"a": 1}}}"#,
        )
        .unwrap();
        assert_eq!(config.module_attribute, "data-behavior");
        assert_eq!(config.conditions_attribute, "data-conditions");
        assert_eq!(config.default_options["ui/menu"], json!({"a": 1}));
    }

    #[test]
    fn test_validation_errors() {
        let config = RegistryConfig {
            priority_attribute: " ".into(),
            ..RegistryConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::EmptyAttribute {
                field: "priority_attribute"
            })
        );

        let config = RegistryConfig {
            conditions_attribute: "data-module".into(),
            ..RegistryConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::DuplicateAttribute { .. })
        ));

        let err = RegistryConfig::from_json(r#"{"default_options": {"ui/menu": 3}}"#).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidDefaultOptions {
                path: "ui/menu".into()
            }
        );

        assert!(matches!(
            RegistryConfig::from_json("{"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_options_merge() {
        let mut config = RegistryConfig::default();
        config
            .default_options
            .insert("ui/menu".into(), json!({"collapsed": true, "label": "Menu"}));

        assert_eq!(
            config.options_for("ui/menu", json!({"label": "Nav"})),
            json!({"collapsed": true, "label": "Nav"})
        );
        assert_eq!(
            config.options_for("ui/menu", Value::Null),
            json!({"collapsed": true, "label": "Menu"})
        );
        assert_eq!(config.options_for("ui/other", json!({"x": 1})), json!({"x": 1}));
    }
}
