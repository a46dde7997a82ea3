//! Parent stream router

use super::types::Partition;
use crate::error::{Error, Result};
use crate::schema::OutputRecord;

/// Parent-based partition router
///
/// Derives one partition per parent record, keyed on the parent's
/// identifier field.
#[derive(Debug, Clone)]
pub struct ParentRouter {
    /// Child stream being partitioned
    stream: String,
    /// Key to extract from parent records
    parent_key: String,
    /// Field name for partition
    partition_field: String,
}

impl ParentRouter {
    /// Create a new parent router
    pub fn new(
        stream: impl Into<String>,
        parent_key: impl Into<String>,
        partition_field: impl Into<String>,
    ) -> Self {
        Self {
            stream: stream.into(),
            parent_key: parent_key.into(),
            partition_field: partition_field.into(),
        }
    }

    /// Field name the parent id is bound to
    pub fn partition_field(&self) -> &str {
        &self.partition_field
    }

    /// Partition for one emitted parent record
    pub fn partition_for(&self, parent: &OutputRecord) -> Result<Partition> {
        let id = parent
            .get(&self.parent_key)
            .and_then(|value| value.as_key())
            .ok_or_else(|| {
                Error::partition(
                    &self.stream,
                    format!(
                        "parent record from '{}' has no '{}'",
                        parent.stream, self.parent_key
                    ),
                )
            })?;

        Ok(Partition::new(&id).with_value(self.partition_field.clone(), id))
    }
}
