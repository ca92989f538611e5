//! Engine configuration.
//!
//! Configuration is plain data owned by the caller: two thresholds, the
//! normalized length cap and a per-group allow-list of rule ids. Documents are loaded from YAML or JSON,
//! checked against the embedded JSON Schema, then validated against the
//! rule registry.

mod policy;
mod schema;

pub use policy::{default_allow_list, DEFAULT_POLICY_YAML};
pub use schema::validate_config_schema;

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::rules;
use crate::tuning::{
    DEBUG_CONFIDENCE_THRESHOLD, DEFAULT_CONFIDENCE_THRESHOLD, MAX_CHARS, MIN_LEGIBLE_CHARS,
};
use crate::types::RuleGroup;

/// Errors that can occur when loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config validation failed: {0}")]
    Validation(String),

    #[error("Config does not match schema: {}", .0.join("; "))]
    Schema(Vec<String>),
}

fn default_confidence_threshold() -> f64 {
    DEFAULT_CONFIDENCE_THRESHOLD
}

fn default_debug_threshold() -> f64 {
    DEBUG_CONFIDENCE_THRESHOLD
}

fn default_max_chars() -> usize {
    MAX_CHARS
}

/// Thresholds and rule selection for the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Findings below this confidence are dropped
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f64,

    /// Threshold for debug runs
    #[serde(default = "default_debug_threshold")]
    pub debug_threshold: f64,

    /// Normalized documents are cut to this many characters
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,

    /// Enabled rule ids per group; a missing or empty list enables the whole group
    #[serde(default)]
    pub allow_list: BTreeMap<RuleGroup, Vec<String>>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            debug_threshold: DEBUG_CONFIDENCE_THRESHOLD,
            max_chars: MAX_CHARS,
            allow_list: default_allow_list(),
        }
    }
}

impl EngineConfig {
    /// Parse a configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let value: serde_json::Value = serde_yaml::from_str(yaml)?;
        Self::from_value(value)
    }

    /// Parse a configuration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    /// Parse a configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Parse a configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Load by extension: `.json` as JSON, anything else as YAML.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::from_json_file(path),
            _ => Self::from_yaml_file(path),
        }
    }

    fn from_value(value: serde_json::Value) -> Result<Self, ConfigError> {
        validate_config_schema(&value).map_err(ConfigError::Schema)?;
        let config: EngineConfig = serde_json::from_value(value)?;
        config.validate()?;
        Ok(config)
    }

    /// Enabled rule ids for `group`; empty means the whole group.
    pub fn allowed(&self, group: RuleGroup) -> &[String] {
        self.allow_list.get(&group).map(Vec::as_slice).unwrap_or_default()
    }

    /// Check thresholds and allow-lists against the rule registry.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("confidence_threshold", self.confidence_threshold),
            ("debug_threshold", self.debug_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Validation(format!(
                    "{} must be within [0, 1], got {}",
                    name, value
                )));
            }
        }

        if self.max_chars < MIN_LEGIBLE_CHARS {
            return Err(ConfigError::Validation(format!(
                "max_chars must be at least {}, got {}",
                MIN_LEGIBLE_CHARS, self.max_chars
            )));
        }

        for (group, ids) in &self.allow_list {
            let mut seen = HashSet::new();
            for id in ids {
                match rules::find(id) {
                    Some(entry) if entry.group == *group => {}
                    Some(entry) => {
                        return Err(ConfigError::Validation(format!(
                            "rule '{}' belongs to group '{}', not '{}'",
                            id, entry.group, group
                        )))
                    }
                    None => {
                        return Err(ConfigError::Validation(format!(
                            "unknown rule '{}' in allow-list for '{}'",
                            id, group
                        )))
                    }
                }
                if !seen.insert(id.as_str()) {
                    return Err(ConfigError::Validation(format!(
                        "duplicate rule '{}' in allow-list for '{}'",
                        id, group
                    )));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::ids;

    #[test]
    fn test_default_policy_matches_builtin_default() {
        let loaded = EngineConfig::from_yaml(DEFAULT_POLICY_YAML).unwrap();
        assert_eq!(loaded, EngineConfig::default());
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let config = EngineConfig::from_json("{}").unwrap();
        assert_eq!(config.confidence_threshold, 0.6);
        assert_eq!(config.debug_threshold, 0.5);
        assert!(config.allowed(RuleGroup::Rental).is_empty());
    }

    #[test]
    fn test_unknown_rule_rejected() {
        let yaml = "allow_list:\n  alquiler:\n    - alquiler-inexistente\n";
        let err = EngineConfig::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_rule_in_wrong_group_rejected() {
        let json = format!(r#"{{"allow_list": {{"servicios": ["{}"]}}}}"#, ids::RENTAL_DEPOSIT);
        let err = EngineConfig::from_json(&json).unwrap_err();
        assert!(err.to_string().contains("belongs to group"));
    }

    #[test]
    fn test_duplicate_rule_rejected() {
        let yaml = "allow_list:\n  laboral:\n    - laboral-periodo-prueba\n    - laboral-periodo-prueba\n";
        let err = EngineConfig::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn test_schema_violation_rejected() {
        let err = EngineConfig::from_yaml("confidence_threshold: 2\n").unwrap_err();
        assert!(matches!(err, ConfigError::Schema(_)));

        let err = EngineConfig::from_yaml("extra: true\n").unwrap_err();
        assert!(matches!(err, ConfigError::Schema(_)));
    }

    #[test]
    fn test_threshold_range_checked_without_schema() {
        let config = EngineConfig {
            confidence_threshold: f64::NAN,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_max_chars_override() {
        let config = EngineConfig::from_yaml("max_chars: 5000\n").unwrap();
        assert_eq!(config.max_chars, 5000);
        assert_eq!(EngineConfig::default().max_chars, MAX_CHARS);

        let err = EngineConfig::from_yaml("max_chars: 3\n").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        let err = EngineConfig::from_yaml("max_chars: -1\n").unwrap_err();
        assert!(matches!(err, ConfigError::Schema(_)));
    }
}
