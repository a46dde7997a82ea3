//! JSON record decoder

use super::types::RecordDecoder;
use crate::error::{Error, Result};
use serde_json::Value;

/// JSON decoder with optional record path extraction
#[derive(Debug, Clone, Default)]
pub struct JsonDecoder {
    /// Path to the records inside an object envelope
    record_path: Option<String>,
}

impl JsonDecoder {
    /// Create a new JSON decoder
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a JSON decoder with a record path
    pub fn with_path(path: impl Into<String>) -> Self {
        Self {
            record_path: Some(path.into()),
        }
    }

    /// The configured record path
    pub fn record_path(&self) -> Option<&str> {
        self.record_path.as_deref()
    }

    fn extract_from_envelope(&self, value: &Value) -> Result<Vec<Value>> {
        let Some(path) = &self.record_path else {
            return Err(Error::pagination(
                "response is an object but no record path is configured",
            ));
        };

        if path.contains('*') {
            return extract_with_jsonpath(value, path);
        }

        match lookup_path(value, path) {
            Some(Value::Array(arr)) => Ok(arr.clone()),
            Some(Value::Null) | None => Ok(Vec::new()),
            Some(other) => Err(Error::pagination(format!(
                "record path '{path}' resolved to {} instead of an array",
                json_kind(other)
            ))),
        }
    }
}

impl RecordDecoder for JsonDecoder {
    fn decode(&self, body: &Value) -> Result<Vec<Value>> {
        match body {
            Value::Array(arr) => Ok(arr.clone()),
            Value::Object(_) => self.extract_from_envelope(body),
            Value::Null => Ok(Vec::new()),
            other => Err(Error::pagination(format!(
                "response body is {} instead of an array or object",
                json_kind(other)
            ))),
        }
    }
}

/// Resolve a simple dot path (`$.a.b`, `a.b`) inside a JSON value
pub fn lookup_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let path = path.strip_prefix("$.").unwrap_or(path);
    if path.is_empty() || path == "$" {
        return Some(value);
    }

    let mut current = value;
    for part in path.split('.') {
        match current {
            Value::Object(map) => current = map.get(part)?,
            _ => return None,
        }
    }
    Some(current)
}

/// Extract records using jsonpath-rust
fn extract_with_jsonpath(value: &Value, path: &str) -> Result<Vec<Value>> {
    use jsonpath_rust::JsonPath;

    let jp = JsonPath::try_from(path).map_err(|e| Error::JsonPath {
        message: format!("Invalid JSONPath '{path}': {e}"),
    })?;

    match jp.find(value) {
        Value::Array(arr) => Ok(arr),
        Value::Null => Ok(vec![]),
        other => Ok(vec![other]),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
