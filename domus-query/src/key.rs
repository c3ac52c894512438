//! Canonical cache keys.
//!
//! A key is the resource's base name, optionally followed by `?` and the
//! JSON encoding of its canonical parameters. Canonical parameters have
//! null and empty-string values removed and keys sorted, so one logical
//! query always lands in one cache slot no matter the order its filters
//! were set in.

use domus_core::QueryParams;
use serde_json::Value;
use std::collections::BTreeMap;

const PARAMS_SEPARATOR: char = '?';

/// Build the cache key for `base` queried with `params`.
pub fn build_key(base: &str, params: &QueryParams) -> String {
    let canonical: BTreeMap<String, Value> = params
        .canonical()
        .into_iter()
        .map(|(k, v)| (k, sorted(&v)))
        .collect();
    if canonical.is_empty() {
        return base.to_string();
    }
    match serde_json::to_string(&canonical) {
        Ok(encoded) => format!("{}{}{}", base, PARAMS_SEPARATOR, encoded),
        Err(_) => base.to_string(),
    }
}

// serde_json may be built with `preserve_order`, so nested objects are
// rebuilt in key order explicitly.
fn sorted(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut fields: Vec<(&String, &Value)> = map.iter().collect();
            fields.sort_by(|a, b| a.0.cmp(b.0));
            Value::Object(
                fields
                    .into_iter()
                    .map(|(k, v)| (k.clone(), sorted(v)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.iter().map(sorted).collect()),
        other => other.clone(),
    }
}

/// Resource base of a key built by [`build_key`].
pub fn base_of(key: &str) -> &str {
    key.split_once(PARAMS_SEPARATOR)
        .map(|(base, _)| base)
        .unwrap_or(key)
}
