//! # Value Transforms
//!
//! Deterministic single-value transforms applied in a declared chain
//! between source lookup and type coercion. Table modules contribute their
//! own value functions through [`Transform::Apply`].

use serde_json::Value;

/// One step of a column's transform chain.
#[derive(Debug, Clone)]
pub enum Transform {
    /// Parse a JSON text value into a document. Non-string or unparseable
    /// input becomes null.
    ParseJson,
    /// Coerce common truthy/falsy strings ("Enabled", "true", "on", ...)
    /// into booleans. Unrecognized input becomes null.
    ToBool,
    /// Replace empty strings with null.
    NullIfEmptyString,
    /// Wrap a lone string into a one-element array; arrays pass through.
    EnsureStringArray,
    /// Table-supplied pure value function.
    Apply(fn(&Value) -> Value),
}

impl Transform {
    pub fn apply(&self, value: &Value) -> Value {
        match self {
            Transform::ParseJson => parse_json(value),
            Transform::ToBool => to_bool(value),
            Transform::NullIfEmptyString => null_if_empty_string(value),
            Transform::EnsureStringArray => ensure_string_array(value),
            Transform::Apply(function) => function(value),
        }
    }
}

fn parse_json(value: &Value) -> Value {
    match value {
        Value::String(text) => serde_json::from_str(text).unwrap_or(Value::Null),
        Value::Null => Value::Null,
        other => other.clone(),
    }
}

fn to_bool(value: &Value) -> Value {
    match value {
        Value::Bool(b) => Value::Bool(*b),
        Value::String(text) => match text.to_ascii_lowercase().as_str() {
            "true" | "t" | "1" | "on" | "yes" | "enabled" => Value::Bool(true),
            "false" | "f" | "0" | "off" | "no" | "disabled" | "suspended" => Value::Bool(false),
            _ => Value::Null,
        },
        Value::Number(n) => Value::Bool(n.as_i64().is_some_and(|i| i != 0)),
        _ => Value::Null,
    }
}

fn null_if_empty_string(value: &Value) -> Value {
    match value {
        Value::String(text) if text.is_empty() => Value::Null,
        other => other.clone(),
    }
}

fn ensure_string_array(value: &Value) -> Value {
    match value {
        Value::Array(_) => value.clone(),
        Value::Null => Value::Null,
        Value::String(text) => Value::Array(vec![Value::String(text.clone())]),
        other => Value::Array(vec![other.clone()]),
    }
}

/// Dotted-path lookup into a JSON document (`"PolicyStatus.IsPublic"`).
pub fn get_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = value;
    for segment in path.split('.') {
        current = current.get(segment)?;
    }
    Some(current)
}

/// Snake-case column name to the provider's PascalCase field convention
/// (`"user_id"` -> `"UserId"`).
pub fn pascal_case(name: &str) -> String {
    name.split('_')
        .map(|segment| {
            let mut chars = segment.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}
