//! Raw record to output record mapping

use super::types::{Field, FieldType, FieldValue, OutputRecord};
use crate::error::{Error, Result};
use serde_json::Value;
use std::collections::HashSet;

/// Maps raw JSON objects of one stream into typed records
#[derive(Debug, Clone)]
pub struct RecordMapper {
    stream: String,
    fields: &'static [Field],
    required: Vec<&'static str>,
    always_included: Vec<&'static str>,
    selected: Option<HashSet<String>>,
}

impl RecordMapper {
    /// Mapper emitting every declared field
    pub fn new(stream: impl Into<String>, fields: &'static [Field]) -> Self {
        Self {
            stream: stream.into(),
            fields,
            required: Vec::new(),
            always_included: Vec::new(),
            selected: None,
        }
    }

    /// Primary-key fields: never null, never deselected
    #[must_use]
    pub fn with_primary_key(mut self, keys: &[&'static str]) -> Self {
        self.required = keys.to_vec();
        self.always_included.extend_from_slice(keys);
        self
    }

    /// A field kept even when deselected (the parent-binding field)
    #[must_use]
    pub fn always_include(mut self, field: &'static str) -> Self {
        self.always_included.push(field);
        self
    }

    /// Restrict output to the selected fields
    #[must_use]
    pub fn with_selection(mut self, selected: Option<HashSet<String>>) -> Self {
        self.selected = selected;
        self
    }

    /// Stream name this mapper belongs to
    pub fn stream(&self) -> &str {
        &self.stream
    }

    fn is_included(&self, name: &str) -> bool {
        match &self.selected {
            None => true,
            Some(selected) => selected.contains(name) || self.always_included.contains(&name),
        }
    }

    /// Map a raw record
    ///
    /// Fails with `SchemaMismatch` when a value cannot be coerced or a
    /// primary-key field is null.
    pub fn map(&self, raw: &Value, parent_id: Option<&str>) -> Result<OutputRecord> {
        let Value::Object(object) = raw else {
            return Err(Error::schema_mismatch(
                &self.stream,
                "<record>",
                format!("expected a JSON object, got {raw}"),
            ));
        };

        let mut fields = Vec::with_capacity(self.fields.len());
        for field in self.fields {
            if !self.is_included(field.name) {
                continue;
            }

            let value = self.coerce(field, object.get(field.name))?;
            if value.is_null() && self.required.contains(&field.name) {
                return Err(Error::schema_mismatch(
                    &self.stream,
                    field.name,
                    "primary key field is null or missing",
                ));
            }
            fields.push((field.name, value));
        }

        Ok(OutputRecord {
            stream: self.stream.clone(),
            parent_id: parent_id.map(str::to_string),
            fields,
        })
    }

    fn coerce(&self, field: &Field, value: Option<&Value>) -> Result<FieldValue> {
        let value = match value {
            None | Some(Value::Null) => return Ok(FieldValue::Null),
            Some(value) => value,
        };

        coerce_value(field.field_type, value).ok_or_else(|| {
            Error::schema_mismatch(
                &self.stream,
                field.name,
                format!("cannot read {value} as {}", field.field_type),
            )
        })
    }
}

/// Coerce a non-null raw value to the declared type
fn coerce_value(field_type: FieldType, value: &Value) -> Option<FieldValue> {
    match (field_type, value) {
        (FieldType::String, Value::String(s)) => Some(FieldValue::String(s.clone())),
        (FieldType::String, Value::Number(n)) => Some(FieldValue::String(n.to_string())),
        (FieldType::String, Value::Bool(b)) => Some(FieldValue::String(b.to_string())),

        (FieldType::Integer, Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().and_then(whole_f64_to_i64))
            .map(FieldValue::Integer),
        (FieldType::Integer, Value::String(s)) => s.trim().parse().ok().map(FieldValue::Integer),

        (FieldType::Number, Value::Number(n)) => n.as_f64().map(FieldValue::Number),
        (FieldType::Number, Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(FieldValue::Number),

        (FieldType::Boolean, Value::Bool(b)) => Some(FieldValue::Boolean(*b)),
        (FieldType::Boolean, Value::String(s)) => match s.as_str() {
            "true" => Some(FieldValue::Boolean(true)),
            "false" => Some(FieldValue::Boolean(false)),
            _ => None,
        },

        _ => None,
    }
}

fn whole_f64_to_i64(f: f64) -> Option<i64> {
    // i64::MAX is not representable as f64, so the upper bound is exclusive
    if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}
