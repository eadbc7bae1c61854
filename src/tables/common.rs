//! # Shared Column Value Functions
//!
//! Pure value functions used by more than one table's transform chains.

use serde_json::{Map, Value};

/// Flatten a provider tag list (`[{"Key": ..., "Value": ...}]`) into a
/// plain object keyed by tag name. Null input stays null.
pub fn tags_to_map(value: &Value) -> Value {
    match value {
        Value::Array(tags) => {
            let mut map = Map::with_capacity(tags.len());
            for tag in tags {
                if let (Some(key), Some(tag_value)) = (
                    tag.get("Key").and_then(Value::as_str),
                    tag.get("Value").and_then(Value::as_str),
                ) {
                    map.insert(key.to_string(), Value::String(tag_value.to_string()));
                }
            }
            Value::Object(map)
        }
        _ => Value::Null,
    }
}

/// Canonical form of an IAM-style policy document for easier searching:
/// object keys lower-cased, action and resource members coerced to sorted,
/// deduplicated arrays, action names lower-cased.
pub fn policy_to_std(value: &Value) -> Value {
    match value {
        Value::Object(fields) => {
            let mut out = Map::with_capacity(fields.len());
            for (key, field_value) in fields {
                let canonical_key = key.to_ascii_lowercase();
                let canonical_value = match canonical_key.as_str() {
                    "action" | "notaction" => string_set(field_value, true),
                    "resource" | "notresource" => string_set(field_value, false),
                    _ => policy_to_std(field_value),
                };
                out.insert(canonical_key, canonical_value);
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(policy_to_std).collect()),
        other => other.clone(),
    }
}

/// Coerce a scalar-or-array member into a sorted, deduplicated string array.
fn string_set(value: &Value, lowercase: bool) -> Value {
    let mut items: Vec<String> = match value {
        Value::String(s) => vec![s.clone()],
        Value::Array(values) => values
            .iter()
            .filter_map(Value::as_str)
            .map(ToString::to_string)
            .collect(),
        _ => return value.clone(),
    };
    if lowercase {
        for item in &mut items {
            *item = item.to_ascii_lowercase();
        }
    }
    items.sort();
    items.dedup();
    Value::Array(items.into_iter().map(Value::String).collect())
}
