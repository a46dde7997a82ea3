//! Schema and record mapping module
//!
//! Static field descriptors for every stream and the mapper that turns raw
//! JSON objects into typed output records.
//!
//! # Features
//!
//! - **Static Schemas**: ordered `&'static [Field]` descriptors
//! - **JSON Schema Output**: descriptors rendered for discovery and SCHEMA messages
//! - **Coercion**: raw values coerced to the declared type or rejected
//! - **Selection**: deselected fields dropped, key fields always kept

mod mapper;
mod types;

pub use mapper::RecordMapper;
pub use types::{
    json_schema, Field, FieldType, FieldValue, JsonSchema, JsonType, JsonTypeOrArray,
    OutputRecord, SchemaProperty,
};
