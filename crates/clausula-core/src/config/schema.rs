//! JSON Schema validation for engine configuration.
//!
//! Configuration documents are validated against
//! schema/engine-config.schema.json before they are deserialized.

use std::sync::OnceLock;

/// Embedded configuration schema (loaded at compile time).
const ENGINE_CONFIG_SCHEMA_JSON: &str = include_str!("../../../../schema/engine-config.schema.json");

/// Compiled JSON Schema validator (initialized once, reused).
static COMPILED_SCHEMA: OnceLock<Result<jsonschema::Validator, String>> = OnceLock::new();

fn get_validator() -> Result<&'static jsonschema::Validator, String> {
    COMPILED_SCHEMA
        .get_or_init(|| {
            let schema_value: serde_json::Value = serde_json::from_str(ENGINE_CONFIG_SCHEMA_JSON)
                .map_err(|e| format!("Invalid schema JSON: {}", e))?;
            jsonschema::options()
                .build(&schema_value)
                .map_err(|e| format!("Failed to compile schema: {}", e))
        })
        .as_ref()
        .map_err(Clone::clone)
}

/// Validate a configuration document against the schema.
///
/// Returns every violation as `"{message} at {path}"`.
pub fn validate_config_schema(config_json: &serde_json::Value) -> Result<(), Vec<String>> {
    let validator = get_validator().map_err(|e| vec![e])?;

    let errors: Vec<String> = validator
        .iter_errors(config_json)
        .map(|e| format!("{} at {}", e, e.instance_path))
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_minimal_config_passes() {
        assert!(validate_config_schema(&json!({})).is_ok());
        assert!(validate_config_schema(&json!({ "confidence_threshold": 0.7 })).is_ok());
    }

    #[test]
    fn test_threshold_out_of_range_fails() {
        let errors = validate_config_schema(&json!({ "confidence_threshold": 1.5 })).unwrap_err();
        assert!(!errors.is_empty());
    }

    #[test]
    fn test_unknown_group_fails() {
        let value = json!({ "allow_list": { "seguros": ["x"] } });
        assert!(validate_config_schema(&value).is_err());
    }

    #[test]
    fn test_additional_properties_fail() {
        let value = json!({ "confidence_threshold": 0.6, "unknown_field": true });
        assert!(validate_config_schema(&value).is_err());
    }

    #[test]
    fn test_malformed_rule_id_fails() {
        let value = json!({ "allow_list": { "alquiler": ["Alquiler_Deposito"] } });
        assert!(validate_config_schema(&value).is_err());
    }
}
