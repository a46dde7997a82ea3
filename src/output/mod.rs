//! Output module
//!
//! Writes protocol messages to the record consumer.
//!
//! # Overview
//!
//! This module provides:
//! - `MessageSink` - the consumer contract the runner writes to
//! - `JsonLinesSink` - one JSON message per line on any writer (stdout in the CLI)
//! - `MemorySink` - collects messages in memory

mod writer;

pub use writer::{JsonLinesSink, MemorySink, MessageSink};
