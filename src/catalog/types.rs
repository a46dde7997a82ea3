//! Catalog document types

use crate::error::{Error, Result};
use crate::schema::json_schema;
use crate::streams::{StreamDefinition, StreamGraph};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

/// Catalog document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    /// One entry per stream
    #[serde(default)]
    pub streams: Vec<CatalogEntry>,
}

/// Catalog entry for one stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Stream identifier
    pub tap_stream_id: String,
    /// Stream name
    #[serde(default)]
    pub stream: String,
    /// JSON schema of the records
    #[serde(default)]
    pub schema: Value,
    /// Primary-key fields
    #[serde(default)]
    pub key_properties: Vec<String>,
    /// Breadcrumb metadata
    #[serde(default)]
    pub metadata: Vec<MetadataEntry>,
}

/// Metadata attached to a breadcrumb (`[]` for the stream, `["properties", f]` for a field)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataEntry {
    /// Path the metadata applies to
    #[serde(default)]
    pub breadcrumb: Vec<String>,
    /// Metadata values
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl MetadataEntry {
    fn new(breadcrumb: Vec<String>) -> Self {
        Self {
            breadcrumb,
            metadata: Map::new(),
        }
    }

    fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }

    /// Field name for `["properties", <field>]` breadcrumbs
    pub fn field(&self) -> Option<&str> {
        match self.breadcrumb.as_slice() {
            [properties, field] if properties == "properties" => Some(field),
            _ => None,
        }
    }

    /// Whether this is the stream-level entry
    pub fn is_stream_level(&self) -> bool {
        self.breadcrumb.is_empty()
    }

    /// Boolean metadata value
    pub fn flag(&self, key: &str) -> Option<bool> {
        self.metadata.get(key).and_then(Value::as_bool)
    }

    /// String metadata value
    pub fn text(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(Value::as_str)
    }
}

impl Catalog {
    /// Parse a catalog document
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::config(format!("Invalid catalog: {e}")))
    }

    /// Load a catalog file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Failed to read catalog {}: {e}", path.display()))
        })?;
        Self::from_json_str(&contents)
    }

    /// Entry for a stream
    pub fn get(&self, stream: &str) -> Option<&CatalogEntry> {
        self.streams.iter().find(|entry| entry.tap_stream_id == stream)
    }

    /// Convert to JSON value
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

impl CatalogEntry {
    /// Stream-level metadata entry
    pub fn stream_metadata(&self) -> Option<&MetadataEntry> {
        self.metadata.iter().find(|m| m.is_stream_level())
    }

    /// Metadata entry of a field
    pub fn field_metadata(&self, field: &str) -> Option<&MetadataEntry> {
        self.metadata.iter().find(|m| m.field() == Some(field))
    }
}

/// Static catalog describing every stream; no network I/O
pub fn discover(graph: &StreamGraph) -> Catalog {
    Catalog {
        streams: graph.iter().map(|def| entry_for(def)).collect(),
    }
}

fn entry_for(def: &StreamDefinition) -> CatalogEntry {
    let key_properties: Vec<String> = def.primary_key.iter().map(|k| (*k).to_string()).collect();

    let mut stream_meta = MetadataEntry::new(Vec::new())
        .with("inclusion", "available")
        .with("selected-by-default", true)
        .with("table-key-properties", key_properties.clone())
        .with("forced-replication-method", def.replication.method().as_str());
    if let Some(key) = def.replication.replication_key() {
        stream_meta = stream_meta.with("valid-replication-keys", vec![key.to_string()]);
    }
    if let Some(binding) = &def.parent {
        stream_meta = stream_meta.with("parent-tap-stream-id", binding.stream.clone());
    }

    let mut metadata = vec![stream_meta];
    for field in def.schema {
        let automatic = def.primary_key.contains(&field.name)
            || def
                .parent
                .as_ref()
                .is_some_and(|binding| binding.placeholder == field.name)
            || def.replication.replication_key() == Some(field.name);

        metadata.push(
            MetadataEntry::new(vec!["properties".to_string(), field.name.to_string()])
                .with("inclusion", if automatic { "automatic" } else { "available" })
                .with("selected-by-default", true),
        );
    }

    CatalogEntry {
        tap_stream_id: def.name.clone(),
        stream: def.name.clone(),
        schema: json_schema(def.schema).to_json(),
        key_properties,
        metadata,
    }
}
