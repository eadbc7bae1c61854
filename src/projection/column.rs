//! # Column Model
//!
//! Declared output columns and the pure extraction function that reads a
//! column's value out of a hydrated row.

use chrono::DateTime;
use serde_json::Value;
use thiserror::Error;

use crate::hydration::RowHydration;
use crate::provider::RawRow;

use super::transforms::{get_path, pascal_case, Transform};

/// Declared type of an output column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    String,
    Bool,
    Int,
    Double,
    Timestamp,
    Json,
}

/// Where a column's raw value comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnSource {
    /// Dotted path into the base row.
    BaseField(String),
    /// The whole value of a named hydrate result.
    Hydrate(String),
    /// Dotted path into a named hydrate result's value.
    HydrateField { name: String, field: String },
}

/// Errors raised during column extraction.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProjectionError {
    #[error("Required column '{column}' has no source value")]
    RequiredColumnMissing { column: String },
}

/// One declared output column. Read-only once declared.
#[derive(Debug, Clone)]
pub struct Column {
    name: String,
    description: String,
    column_type: ColumnType,
    source: ColumnSource,
    transforms: Vec<Transform>,
    default: Option<Value>,
    required: bool,
}

impl Column {
    /// New column bound, by default, to the base-row field matching the
    /// column name in the provider's PascalCase convention.
    pub fn new(name: &str, column_type: ColumnType, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            column_type,
            source: ColumnSource::BaseField(pascal_case(name)),
            transforms: Vec::new(),
            default: None,
            required: false,
        }
    }

    /// Bind to an explicit base-row field (dotted path).
    pub fn from_field(mut self, path: &str) -> Self {
        self.source = ColumnSource::BaseField(path.to_string());
        self
    }

    /// Bind to the whole value of a hydrate result.
    pub fn from_hydrate(mut self, name: &str) -> Self {
        self.source = ColumnSource::Hydrate(name.to_string());
        self
    }

    /// Bind to a field (dotted path) of a hydrate result's value.
    pub fn from_hydrate_field(mut self, name: &str, field: &str) -> Self {
        self.source = ColumnSource::HydrateField {
            name: name.to_string(),
            field: field.to_string(),
        };
        self
    }

    /// Append a transform to the chain.
    pub fn transform(mut self, transform: Transform) -> Self {
        self.transforms.push(transform);
        self
    }

    /// Value substituted when the source is missing or null.
    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    /// Missing source becomes an extraction error instead of a null value.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn column_type(&self) -> ColumnType {
        self.column_type
    }

    pub fn source(&self) -> &ColumnSource {
        &self.source
    }

    /// Hydrate name this column reads from, if any. Drives lazy hydrate
    /// scheduling for partial-column queries.
    pub fn hydrate_dependency(&self) -> Option<&str> {
        match &self.source {
            ColumnSource::BaseField(_) => None,
            ColumnSource::Hydrate(name) => Some(name),
            ColumnSource::HydrateField { name, .. } => Some(name),
        }
    }
}

/// Extract one column's typed value from a hydrated row.
///
/// Pure: identical inputs always produce identical output, and nothing is
/// mutated.
///
/// # Errors
///
/// Returns [`ProjectionError::RequiredColumnMissing`] when a required
/// column has no source value.
pub fn extract(
    row: &RawRow,
    hydration: &RowHydration,
    column: &Column,
) -> Result<Value, ProjectionError> {
    let source_value = match &column.source {
        ColumnSource::BaseField(path) => get_path(row, path).cloned(),
        ColumnSource::Hydrate(name) => hydration.value(name).cloned(),
        ColumnSource::HydrateField { name, field } => hydration
            .value(name)
            .and_then(|value| get_path(value, field))
            .cloned(),
    };

    let mut value = match source_value {
        Some(value) if !value.is_null() => value,
        _ => {
            if column.required {
                return Err(ProjectionError::RequiredColumnMissing {
                    column: column.name.clone(),
                });
            }
            return Ok(column.default.clone().unwrap_or(Value::Null));
        }
    };

    for transform in &column.transforms {
        value = transform.apply(&value);
    }

    let coerced = coerce(value, column.column_type);
    if coerced.is_null() {
        if let Some(default) = &column.default {
            return Ok(default.clone());
        }
    }
    Ok(coerced)
}

/// Final coercion of a transformed value into the column's declared type.
fn coerce(value: Value, column_type: ColumnType) -> Value {
    if value.is_null() {
        return Value::Null;
    }
    match column_type {
        ColumnType::Json => value,
        ColumnType::String => match value {
            Value::String(_) => value,
            other => Value::String(other.to_string()),
        },
        ColumnType::Bool => match value {
            Value::Bool(_) => value,
            _ => Value::Null,
        },
        ColumnType::Int => match value.as_i64() {
            Some(i) => Value::from(i),
            None => Value::Null,
        },
        ColumnType::Double => match value.as_f64() {
            Some(f) => Value::from(f),
            None => Value::Null,
        },
        ColumnType::Timestamp => match &value {
            // Normalize parseable timestamps to RFC 3339; anything else is null
            Value::String(text) => match DateTime::parse_from_rfc3339(text) {
                Ok(parsed) => Value::String(parsed.to_rfc3339()),
                Err(_) => Value::Null,
            },
            _ => Value::Null,
        },
    }
}
