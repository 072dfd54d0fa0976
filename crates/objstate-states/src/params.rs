//! Ability parameters.
//!
//! Each ability an object is imported with may carry a free-form parameter
//! map (for example `heat_source: {temperature: 180.0}`). The states created
//! for that ability read the keys they understand and fall back to their
//! defaults for anything missing or of the wrong type.

use std::collections::BTreeMap;

/// Parameters attached to one ability.
pub type AbilityParams = BTreeMap<String, serde_json::Value>;

/// Numeric parameter `key`, or `default`.
pub fn param_f64(params: &AbilityParams, key: &str, default: f64) -> f64 {
    params
        .get(key)
        .and_then(serde_json::Value::as_f64)
        .unwrap_or(default)
}

/// Boolean parameter `key`, or `default`.
pub fn param_bool(params: &AbilityParams, key: &str, default: bool) -> bool {
    params
        .get(key)
        .and_then(serde_json::Value::as_bool)
        .unwrap_or(default)
}

/// Non-negative integer parameter `key`, or `default`.
pub fn param_usize(params: &AbilityParams, key: &str, default: usize) -> usize {
    params
        .get(key)
        .and_then(serde_json::Value::as_u64)
        .and_then(|v| usize::try_from(v).ok())
        .unwrap_or(default)
}
