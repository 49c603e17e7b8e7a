//! Argument validation
//!
//! Runs strictly before any transport I/O.

use crate::error::CallError;
use crate::registry::CallSchema;
use crate::types::Kwargs;
use serde_json::Value;

/// Check that every mandatory kwarg is present
///
/// Fails on the first missing key, in schema order. `null` counts as
/// present; only an absent key is "undefined".
pub fn validate(schema: &CallSchema, kwargs: &Kwargs) -> Result<(), CallError> {
    match schema
        .mandatory_kwargs
        .iter()
        .find(|name| !kwargs.contains_key(**name))
    {
        Some(missing) => Err(CallError::InvalidArgument(missing.to_string())),
        None => Ok(()),
    }
}

/// Turn a caller-supplied JSON value into a kwargs map
///
/// `null` means "no kwargs". Anything other than an object is rejected.
pub fn kwargs_from_value(value: Value) -> Result<Kwargs, CallError> {
    match value {
        Value::Null => Ok(Kwargs::new()),
        Value::Object(map) => Ok(map),
        other => Err(CallError::InvalidArgument(format!(
            "kwargs must be an object, got {}",
            json_type(&other)
        ))),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
