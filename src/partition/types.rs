//! Partition types

use crate::template::TemplateContext;
use serde_json::Value;
use std::collections::HashMap;

/// A partition definition
#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    /// Partition identifier (the parent record's key)
    pub id: String,
    /// Key-value pairs for this partition
    pub values: HashMap<String, Value>,
}

impl Partition {
    /// Create a new partition
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            values: HashMap::new(),
        }
    }

    /// Add a value
    #[must_use]
    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Get a value
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Template context holding this partition's values
    pub fn template_context(&self) -> TemplateContext {
        TemplateContext::from_values(self.values.clone())
    }
}
