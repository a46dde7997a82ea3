//! Decoder traits

use crate::error::Result;
use serde_json::Value;

/// Trait for decoding response bodies into records
pub trait RecordDecoder: Send + Sync {
    /// Decode a parsed response body into the page's raw records
    fn decode(&self, body: &Value) -> Result<Vec<Value>>;
}
