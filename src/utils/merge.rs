/// Deep merge for settings-valve overrides
///
/// A valve is a raw JSON object supplied by the caller and merged on top of
/// every generated request body as the very last step, so it can override any
/// field the builders computed.
use serde_json::Value;

use crate::error::{Error, Result};
use crate::utils::is_blank;

/// Deep-merge `patch` onto `base`.
///
/// Objects merge key-by-key with the patch winning on conflicts, arrays
/// concatenate (base first), and anything else is overwritten by the patch.
/// A `null` patch leaves the base untouched.
pub fn merge(base: Value, patch: Value) -> Value {
    match (base, patch) {
        (Value::Object(mut base_map), Value::Object(patch_map)) => {
            for (key, patch_value) in patch_map {
                match base_map.remove(&key) {
                    Some(base_value) => {
                        base_map.insert(key, merge(base_value, patch_value));
                    }
                    None => {
                        base_map.insert(key, patch_value);
                    }
                }
            }
            Value::Object(base_map)
        }
        (Value::Array(mut base_items), Value::Array(patch_items)) => {
            base_items.extend(patch_items);
            Value::Array(base_items)
        }
        (base, Value::Null) => base,
        (_, patch) => patch,
    }
}

/// Parse a settings valve lazily: blank input is a no-op, malformed JSON is a
/// validation error at build time rather than at submission time.
pub fn parse_settings_valve(valve: Option<&str>) -> Result<Option<Value>> {
    if is_blank(valve) {
        return Ok(None);
    }
    let raw = valve.unwrap_or_default();
    let parsed: Value = serde_json::from_str(raw)
        .map_err(|e| Error::Validation(format!("settings valve is not valid JSON: {}", e)))?;
    Ok(Some(parsed))
}

/// Apply an optional parsed valve to a request body.
pub fn apply_valve(body: Value, valve: Option<&Value>) -> Value {
    match valve {
        Some(patch) => merge(body, patch.clone()),
        None => body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_merge_empty_patch_is_identity() {
        let base = json!({"name": "np", "config": {"machineType": "e2-standard-4"}});
        assert_eq!(merge(base.clone(), json!({})), base);
    }

    #[test]
    fn test_merge_scalar_patch_wins() {
        let base = json!({"initialNodeCount": 3});
        let merged = merge(base, json!({"initialNodeCount": 5}));
        assert_eq!(merged, json!({"initialNodeCount": 5}));
    }

    #[test]
    fn test_merge_recurses_into_nested_maps() {
        let base = json!({"config": {"machineType": "e2-standard-4", "diskType": "pd-ssd"}});
        let patch = json!({"config": {"diskType": "pd-balanced", "localSsdCount": 1}});
        let merged = merge(base, patch);
        assert_eq!(
            merged,
            json!({"config": {
                "machineType": "e2-standard-4",
                "diskType": "pd-balanced",
                "localSsdCount": 1
            }})
        );
    }

    #[test]
    fn test_merge_concatenates_sequences() {
        let base = json!({"oauthScopes": ["a", "b"]});
        let patch = json!({"oauthScopes": ["c"]});
        let merged = merge(base, patch);
        assert_eq!(merged["oauthScopes"], json!(["a", "b", "c"]));
        assert_eq!(merged["oauthScopes"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_merge_heterogeneous_types_patch_overwrites() {
        let base = json!({"labels": {"env": "dev"}});
        let merged = merge(base, json!({"labels": "none"}));
        assert_eq!(merged, json!({"labels": "none"}));
    }

    #[test]
    fn test_merge_null_patch_keeps_base() {
        let base = json!({"network": "default"});
        let merged = merge(base, json!({"network": null}));
        assert_eq!(merged, json!({"network": "default"}));
    }

    #[test]
    fn test_parse_settings_valve_blank_is_noop() {
        assert!(parse_settings_valve(None).unwrap().is_none());
        assert!(parse_settings_valve(Some("")).unwrap().is_none());
        assert!(parse_settings_valve(Some("   ")).unwrap().is_none());
    }

    #[test]
    fn test_parse_settings_valve_malformed_fails() {
        let result = parse_settings_valve(Some("{not json"));
        assert!(matches!(result, Err(crate::error::Error::Validation(_))));
    }

    #[test]
    fn test_parse_settings_valve_round_trips() {
        let valve = parse_settings_valve(Some(r#"{"loggingService": "none"}"#))
            .unwrap()
            .unwrap();
        assert_eq!(valve, json!({"loggingService": "none"}));
    }
}
