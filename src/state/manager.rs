//! State manager implementation
//!
//! Provides file-based state persistence with atomic writes.

use super::types::{compare_cursors, State};
use crate::error::{Error, Result};
use serde_json::Value;
use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// State manager for persisting and loading state
#[derive(Debug, Clone)]
pub struct StateManager {
    /// Path to the state file, empty in memory-only mode
    path: PathBuf,
    /// Current state (cached)
    state: Arc<RwLock<State>>,
}

impl StateManager {
    /// Create an in-memory state manager (no file persistence)
    pub fn in_memory() -> Self {
        Self::with_state(PathBuf::new(), State::new())
    }

    fn with_state(path: PathBuf, state: State) -> Self {
        Self {
            path,
            state: Arc::new(RwLock::new(state)),
        }
    }

    /// Create a state manager from a file, loading existing state if present
    ///
    /// Flushes are written back to the same file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let state = if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| Error::state(format!("Failed to read state file: {e}")))?;
            parse_state(&contents)?
        } else {
            State::new()
        };

        Ok(Self::with_state(path, state))
    }

    /// Create an in-memory state manager from an inline JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(Self::with_state(PathBuf::new(), parse_state(json)?))
    }

    /// Reload state from the backing file
    pub async fn load(&self) -> Result<()> {
        if self.is_in_memory() || !self.path.exists() {
            return Ok(());
        }

        let contents = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| Error::state(format!("Failed to read state file: {e}")))?;
        let loaded_state = parse_state(&contents)?;

        *self.state.write().await = loaded_state;
        Ok(())
    }

    /// Write current state to the backing file (no-op in memory-only mode)
    pub async fn flush(&self) -> Result<()> {
        if self.is_in_memory() {
            return Ok(());
        }
        self.save_to_file(&self.path).await?;
        debug!(path = %self.path.display(), "State flushed");
        Ok(())
    }

    /// Save state to a specific file path
    pub async fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let contents = self.to_json_pretty().await?;

        // Write to temp file first, then rename for atomicity
        let path = path.as_ref();
        let temp_path = path.with_extension("tmp");
        tokio::fs::write(&temp_path, &contents)
            .await
            .map_err(|e| Error::state(format!("Failed to write state file: {e}")))?;

        tokio::fs::rename(&temp_path, path)
            .await
            .map_err(|e| Error::state(format!("Failed to rename state file: {e}")))?;

        Ok(())
    }

    /// Snapshot of the current state
    pub async fn snapshot(&self) -> State {
        self.state.read().await.clone()
    }

    /// Current state as a JSON value
    pub async fn to_value(&self) -> Result<Value> {
        let state = self.state.read().await;
        serde_json::to_value(&*state)
            .map_err(|e| Error::state(format!("Failed to serialize state: {e}")))
    }

    /// Export state as pretty-printed JSON string
    pub async fn to_json_pretty(&self) -> Result<String> {
        let state = self.state.read().await;
        serde_json::to_string_pretty(&*state)
            .map_err(|e| Error::state(format!("Failed to serialize state: {e}")))
    }

    /// Get cursor for a stream
    pub async fn get_cursor(&self, stream: &str) -> Option<String> {
        let state = self.state.read().await;
        state.get_cursor(stream).map(ToString::to_string)
    }

    /// Set cursor for a stream
    pub async fn set_cursor(&self, stream: &str, cursor: String) {
        self.state.write().await.set_cursor(stream, cursor);
    }

    /// Get the bookmark of a (stream, parent scope) pair
    pub async fn get_scoped_cursor(&self, stream: &str, partition_id: Option<&str>) -> Option<String> {
        let state = self.state.read().await;
        state
            .get_scoped_cursor(stream, partition_id)
            .map(ToString::to_string)
    }

    /// Advance the bookmark of a (stream, parent scope) pair; never moves it backwards
    ///
    /// Returns whether the stored bookmark changed.
    pub async fn advance_cursor(
        &self,
        stream: &str,
        partition_id: Option<&str>,
        candidate: &str,
    ) -> bool {
        let mut state = self.state.write().await;
        let should_update = state
            .get_scoped_cursor(stream, partition_id)
            .map_or(true, |current| {
                compare_cursors(candidate, current) == Ordering::Greater
            });

        if should_update {
            state.set_scoped_cursor(stream, partition_id, candidate.to_string());
        }
        should_update
    }

    /// Check if a partition is completed
    pub async fn is_partition_completed(&self, stream: &str, partition_id: &str) -> bool {
        let state = self.state.read().await;
        state
            .get_stream(stream)
            .is_some_and(|s| s.is_partition_completed(partition_id))
    }

    /// Mark a partition as completed
    pub async fn mark_partition_completed(&self, stream: &str, partition_id: &str) {
        self.state
            .write()
            .await
            .get_stream_mut(stream)
            .mark_partition_completed(partition_id);
    }

    /// Clear state for a specific stream
    pub async fn clear_stream(&self, stream: &str) {
        self.state.write().await.streams.remove(stream);
    }

    /// Get the state file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check if using in-memory mode
    pub fn is_in_memory(&self) -> bool {
        self.path.as_os_str().is_empty()
    }
}

fn parse_state(contents: &str) -> Result<State> {
    if contents.trim().is_empty() {
        return Ok(State::new());
    }
    serde_json::from_str(contents)
        .map_err(|e| Error::state(format!("Failed to parse state: {e}")))
}
