//! State management module
//!
//! Handles bookmark tracking, checkpointing, and resumability.
//! State is persisted between sync runs so that a run can resume or refresh.
//!
//! # Overview
//!
//! The state module provides:
//! - `State` - Bookmarks per stream and per parent scope
//! - `StateManager` - Shared state with file persistence
//! - Checkpointing via atomic temp-file writes

mod manager;
mod types;

pub use manager::StateManager;
pub use types::{compare_cursors, PartitionState, State, StreamState, COMPLETE};
