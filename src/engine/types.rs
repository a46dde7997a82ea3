//! Engine types
//!
//! Protocol messages and run bookkeeping for the catalog runner.

use crate::schema::OutputRecord;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;

/// A message emitted during sync
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Message {
    /// Stream schema, sent once before the stream's first record
    Schema {
        /// Stream name
        stream: String,
        /// JSON schema of the records
        schema: Value,
        /// Primary-key fields
        key_properties: Vec<String>,
        /// Replication key for incremental streams
        #[serde(skip_serializing_if = "Vec::is_empty")]
        bookmark_properties: Vec<String>,
    },
    /// One record
    Record {
        /// Stream name
        stream: String,
        /// The record
        record: OutputRecord,
        /// Extraction time
        time_extracted: DateTime<Utc>,
    },
    /// Full bookmark document
    State {
        /// State value
        value: Value,
    },
}

impl Message {
    /// Create a record message stamped with the current time
    pub fn record(record: OutputRecord) -> Self {
        Self::Record {
            stream: record.stream.clone(),
            record,
            time_extracted: Utc::now(),
        }
    }

    /// Create a state message
    pub fn state(value: Value) -> Self {
        Self::State { value }
    }

    /// Stream the message belongs to
    pub fn stream(&self) -> Option<&str> {
        match self {
            Self::Schema { stream, .. } | Self::Record { stream, .. } => Some(stream),
            Self::State { .. } => None,
        }
    }

    /// Check if this is a schema message
    pub fn is_schema(&self) -> bool {
        matches!(self, Self::Schema { .. })
    }

    /// Check if this is a record message
    pub fn is_record(&self) -> bool {
        matches!(self, Self::Record { .. })
    }

    /// Check if this is a state message
    pub fn is_state(&self) -> bool {
        matches!(self, Self::State { .. })
    }
}

/// Lifecycle of one stream instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InstanceStatus {
    /// Not started yet
    Pending,
    /// Fetching pages
    Running,
    /// Exhausted without unrecoverable error
    Complete,
    /// Ended by an unrecoverable error
    Failed,
    /// Deselected, never started
    Skipped,
}

impl InstanceStatus {
    /// Whether the instance has reached an end state
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Complete | Self::Failed | Self::Skipped)
    }
}

/// Outcome of one stream instance
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceReport {
    /// Stream name
    pub stream: String,
    /// Parent identifier for child instances
    pub parent_id: Option<String>,
    /// Final status
    pub status: InstanceStatus,
    /// Records emitted
    pub records: u64,
    /// Records dropped on schema mismatch
    pub dropped: u64,
    /// Error message for failed instances
    pub error: Option<String>,
}

/// Per-stream totals
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamSummary {
    /// Instances that completed
    pub completed: u64,
    /// Instances that failed
    pub failed: u64,
    /// Records emitted
    pub records: u64,
    /// Records dropped on schema mismatch
    pub dropped: u64,
}

/// Statistics from a sync run
#[derive(Debug, Clone, Default)]
pub struct SyncSummary {
    /// Every finished instance, in completion order
    pub instances: Vec<InstanceReport>,
    /// Streams not run because nothing selected them
    pub skipped: Vec<String>,
    /// Wall-clock duration
    pub duration: Duration,
}

impl SyncSummary {
    /// Record a finished instance
    pub fn add_instance(&mut self, report: InstanceReport) {
        self.instances.push(report);
    }

    /// Whether any instance failed
    pub fn has_failures(&self) -> bool {
        self.instances
            .iter()
            .any(|i| i.status == InstanceStatus::Failed)
    }

    /// Whether a stream had a failed instance
    pub fn stream_failed(&self, stream: &str) -> bool {
        self.instances
            .iter()
            .any(|i| i.stream == stream && i.status == InstanceStatus::Failed)
    }

    /// Totals per stream
    pub fn by_stream(&self) -> BTreeMap<String, StreamSummary> {
        let mut totals: BTreeMap<String, StreamSummary> = BTreeMap::new();
        for instance in &self.instances {
            let entry = totals.entry(instance.stream.clone()).or_default();
            match instance.status {
                InstanceStatus::Complete => entry.completed += 1,
                InstanceStatus::Failed => entry.failed += 1,
                _ => {}
            }
            entry.records += instance.records;
            entry.dropped += instance.dropped;
        }
        totals
    }

    /// Total records emitted
    pub fn total_records(&self) -> u64 {
        self.instances.iter().map(|i| i.records).sum()
    }
}
