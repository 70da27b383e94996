//! Typed decoding of structured responses
//!
//! The transport hands over the top-level JSON object as a map of field name
//! to raw value. [`decode`] turns that map into any deserializable model,
//! recursing through nested objects and arrays in source order and reporting
//! the path of the first value that does not fit.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{Error, Result};

/// Top-level field name to raw JSON value
pub type RawFields = serde_json::Map<String, Value>;

/// Parse a response body into its top-level field map
///
/// # Errors
///
/// Returns [`Error::Decode`] if the body is not valid JSON or is not a JSON object
pub fn parse_fields(body: &[u8]) -> Result<RawFields> {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(fields)) => Ok(fields),
        Ok(other) => Err(Error::Decode {
            path: ".".to_owned(),
            message: format!("expected a JSON object, found {}", kind(&other)),
        }),
        Err(e) => Err(Error::Decode {
            path: ".".to_owned(),
            message: e.to_string(),
        }),
    }
}

/// Decode a field map into `T`
///
/// Nothing is returned on failure: a partially decoded value is dropped.
///
/// # Errors
///
/// Returns [`Error::Decode`] naming the offending field path on a type
/// mismatch or a missing required field
pub fn decode<T: DeserializeOwned>(fields: RawFields) -> Result<T> {
    serde_path_to_error::deserialize(Value::Object(fields)).map_err(|e| {
        let path = e.path().to_string();
        Error::Decode {
            path,
            message: e.into_inner().to_string(),
        }
    })
}

const fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
