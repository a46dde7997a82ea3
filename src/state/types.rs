//! State types for tracking sync progress
//!
//! These types are serialized to JSON and persisted between runs.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Bookmark value of a full-table stream after a successful run
pub const COMPLETE: &str = "complete";

/// Complete state for the tap
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct State {
    /// Per-stream state
    #[serde(default)]
    pub streams: BTreeMap<String, StreamState>,
}

impl State {
    /// Create a new empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// Get state for a stream
    pub fn get_stream(&self, stream: &str) -> Option<&StreamState> {
        self.streams.get(stream)
    }

    /// Get mutable state for a stream, creating if needed
    pub fn get_stream_mut(&mut self, stream: &str) -> &mut StreamState {
        self.streams.entry(stream.to_string()).or_default()
    }

    /// Get cursor for a stream
    pub fn get_cursor(&self, stream: &str) -> Option<&str> {
        self.streams.get(stream)?.cursor.as_deref()
    }

    /// Set cursor for a stream
    pub fn set_cursor(&mut self, stream: &str, cursor: String) {
        self.get_stream_mut(stream).cursor = Some(cursor);
    }

    /// Bookmark for a (stream, parent scope) pair
    pub fn get_scoped_cursor(&self, stream: &str, partition_id: Option<&str>) -> Option<&str> {
        match partition_id {
            None => self.get_cursor(stream),
            Some(id) => self
                .get_stream(stream)?
                .get_partition(id)?
                .cursor
                .as_deref(),
        }
    }

    /// Set the bookmark for a (stream, parent scope) pair
    pub fn set_scoped_cursor(&mut self, stream: &str, partition_id: Option<&str>, cursor: String) {
        match partition_id {
            None => self.set_cursor(stream, cursor),
            Some(id) => {
                self.get_stream_mut(stream).get_partition_mut(id).cursor = Some(cursor);
            }
        }
    }
}

/// State for a single stream
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamState {
    /// Current cursor value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,

    /// Per-parent state for child streams
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub partitions: BTreeMap<String, PartitionState>,
}

impl StreamState {
    /// Create a new empty stream state
    pub fn new() -> Self {
        Self::default()
    }

    /// Get partition state
    pub fn get_partition(&self, partition_id: &str) -> Option<&PartitionState> {
        self.partitions.get(partition_id)
    }

    /// Get mutable partition state, creating if needed
    pub fn get_partition_mut(&mut self, partition_id: &str) -> &mut PartitionState {
        self.partitions.entry(partition_id.to_string()).or_default()
    }

    /// Check if a partition is completed
    pub fn is_partition_completed(&self, partition_id: &str) -> bool {
        self.partitions
            .get(partition_id)
            .is_some_and(|p| p.completed)
    }

    /// Mark a partition as completed
    pub fn mark_partition_completed(&mut self, partition_id: &str) {
        self.get_partition_mut(partition_id).completed = true;
    }
}

/// State for a single partition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartitionState {
    /// Cursor value within this partition
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,

    /// Whether this partition has been fully synced
    #[serde(default)]
    pub completed: bool,
}

/// Order two bookmark values
///
/// Numeric when both parse as numbers, lexicographic otherwise (ISO-8601
/// timestamps order correctly as text).
pub fn compare_cursors(a: &str, b: &str) -> Ordering {
    match (a.parse::<f64>(), b.parse::<f64>()) {
        (Ok(x), Ok(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        _ => a.cmp(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_state_default() {
        let state = State::new();
        assert!(state.streams.is_empty());
    }

    #[test]
    fn test_state_cursor() {
        let mut state = State::new();
        assert!(state.get_cursor("industries").is_none());

        state.set_cursor("industries", COMPLETE.to_string());
        assert_eq!(state.get_cursor("industries"), Some("complete"));
    }

    #[test]
    fn test_scoped_cursor() {
        let mut state = State::new();
        state.set_scoped_cursor("emerging_skills", Some("1"), "2024-01-01".to_string());
        state.set_scoped_cursor("industries", None, "x".to_string());

        assert_eq!(
            state.get_scoped_cursor("emerging_skills", Some("1")),
            Some("2024-01-01")
        );
        assert_eq!(state.get_scoped_cursor("emerging_skills", Some("2")), None);
        assert_eq!(state.get_scoped_cursor("emerging_skills", None), None);
        assert_eq!(state.get_scoped_cursor("industries", None), Some("x"));
    }

    #[test]
    fn test_stream_state_partitions() {
        let mut stream_state = StreamState::new();

        assert!(!stream_state.is_partition_completed("p1"));

        stream_state.mark_partition_completed("p1");
        assert!(stream_state.is_partition_completed("p1"));
        assert!(!stream_state.is_partition_completed("p2"));
    }

    #[test]
    fn test_state_document_shape() {
        let mut state = State::new();
        state.set_cursor("industries", "complete".to_string());
        state
            .get_stream_mut("emerging_skills")
            .mark_partition_completed("1");

        assert_eq!(
            serde_json::to_value(&state).unwrap(),
            json!({
                "streams": {
                    "emerging_skills": {"partitions": {"1": {"completed": true}}},
                    "industries": {"cursor": "complete"}
                }
            })
        );

        let restored: State = serde_json::from_value(serde_json::to_value(&state).unwrap()).unwrap();
        assert_eq!(restored, state);
    }

    #[test]
    fn test_compare_cursors() {
        assert_eq!(compare_cursors("9", "10"), Ordering::Less);
        assert_eq!(compare_cursors("2.5", "2.50"), Ordering::Equal);
        assert_eq!(
            compare_cursors("2024-02-01T00:00:00Z", "2024-01-31T23:59:59Z"),
            Ordering::Greater
        );
        assert_eq!(compare_cursors("abc", "abd"), Ordering::Less);
    }
}
