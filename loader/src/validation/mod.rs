//! Type coercion and row validation.
//!
//! Every declared field is normalized (see [`crate::normalize`]) and then
//! coerced into its declared type. All failures of a row are collected before
//! the row is rejected, so one error report lists every bad field.
//!
//! # Example
//!
//! ```rust,ignore
//! use serde_json::json;
//! use csvload::{validate_record, RowSchema};
//!
//! let schema = RowSchema::builder()
//!     .required_int("index")
//!     .optional_string("note")
//!     .build()?;
//!
//! let params = json!({ "index": " 42 ", "note": "" });
//! let record = validate_record(&schema, params.as_object().unwrap())?;
//! assert_eq!(record.get("index").and_then(|v| v.as_i64()), Some(42));
//! assert_eq!(record.get("note"), None);
//! ```

use serde_json::{Map, Value};

use crate::error::FieldError;
use crate::models::{FieldValue, RowRecord};
use crate::normalize::{normalize_value, Normalized};
use crate::schema::{FieldSpec, FieldType, RowSchema};

/// Validate a name→value mapping against a schema.
///
/// Keys that are not declared by the schema are ignored; declared fields
/// missing from the mapping are treated as absent.
pub fn validate_record(
    schema: &RowSchema,
    params: &Map<String, Value>,
) -> Result<RowRecord, Vec<FieldError>> {
    let config = schema.normalization();
    let mut fields = Vec::with_capacity(schema.len());
    let mut errors = Vec::new();

    for spec in schema.fields() {
        let normalized = match params.get(&spec.name) {
            Some(raw) => normalize_value(raw, spec, config),
            None => Normalized::Absent,
        };

        match coerce_value(normalized, spec) {
            Ok(value) => fields.push((spec.name.clone(), value)),
            Err(e) => errors.push(e),
        }
    }

    if errors.is_empty() {
        Ok(RowRecord::new(fields))
    } else {
        Err(errors)
    }
}

/// Coerce a normalized value into the field's declared type.
///
/// `Ok(None)` is an absent optional field.
pub fn coerce_value(normalized: Normalized, spec: &FieldSpec) -> Result<Option<FieldValue>, FieldError> {
    let value = match normalized {
        Normalized::Absent if spec.required => return Err(FieldError::missing(&spec.name)),
        Normalized::Absent => return Ok(None),
        Normalized::Value(v) => v,
    };

    let typed = match (spec.field_type, &value) {
        (FieldType::String, Value::String(s)) => FieldValue::Str(s.clone()),
        (FieldType::String, Value::Number(n)) => FieldValue::Str(n.to_string()),

        (FieldType::Integer, Value::String(s)) => s
            .parse::<i64>()
            .map(FieldValue::Int)
            .map_err(|_| type_error(spec, &value))?,
        (FieldType::Integer, Value::Number(n)) => {
            n.as_i64().map(FieldValue::Int).ok_or_else(|| type_error(spec, &value))?
        }

        // finite values only, JSON has no inf or NaN
        (FieldType::Float, Value::String(s)) => s
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(FieldValue::Float)
            .ok_or_else(|| type_error(spec, &value))?,
        (FieldType::Float, Value::Number(n)) => {
            n.as_f64().map(FieldValue::Float).ok_or_else(|| type_error(spec, &value))?
        }

        (FieldType::Boolean, Value::Bool(b)) => FieldValue::Bool(*b),

        _ => return Err(type_error(spec, &value)),
    };

    Ok(Some(typed))
}

/// Creates a type mismatch error quoting the offending value.
fn type_error(spec: &FieldSpec, value: &Value) -> FieldError {
    let shown = match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    FieldError::invalid_type(&spec.name, shown, spec.field_type)
}
