//! # tap-faethm
//!
//! A Singer tap extracting industries and skills data from the Faethm API.
//!
//! ## Features
//!
//! - **Parent/child streams**: per-industry skill streams driven by the
//!   industries stream, depth-first
//! - **Resilient HTTP**: bearer auth, request spacing, retries with backoff
//!   and `Retry-After` support
//! - **Pagination**: response cursor and last-record cursor
//! - **Bookmarks**: state flushed after every root page, resumable runs
//! - **Singer output**: SCHEMA, RECORD and STATE messages as JSON lines
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tap_faethm::catalog::Selection;
//! use tap_faethm::config::TapConfig;
//! use tap_faethm::context::RunContext;
//! use tap_faethm::engine::CatalogRunner;
//! use tap_faethm::output::JsonLinesSink;
//! use tap_faethm::state::StateManager;
//! use tap_faethm::streams::{faethm_streams, StreamGraph};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> tap_faethm::Result<()> {
//!     let config = TapConfig::from_file("config.json")?;
//!     let graph = StreamGraph::new(faethm_streams())?;
//!     let selection = Selection::all(&graph);
//!
//!     let ctx = RunContext::new(config, StateManager::from_file("state.json")?)?;
//!     let mut runner = CatalogRunner::new(ctx, graph, selection, JsonLinesSink::stdout());
//!     let summary = runner.run().await?;
//!     assert!(!summary.has_failures());
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                          CLI Runner                             │
//! │     spec     check     discover → Catalog     sync → stdout     │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//! ┌─────────────────────────────────────────────────────────────────┐
//! │              CatalogRunner (depth-first, STATE per page)        │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//! ┌──────────┬───────────┬───────┴───────┬───────────┬─────────────┐
//! │  Stream  │   HTTP    │   Paginate    │ Partition │   Schema    │
//! ├──────────┼───────────┼───────────────┼───────────┼─────────────┤
//! │ Graph    │ Bearer    │ Cursor        │ Parent id │ Field types │
//! │ Sync     │ Retry     │ Last record   │           │ Coercion    │
//! │ Enrich   │ Spacing   │               │           │ Selection   │
//! └──────────┴───────────┴───────────────┴───────────┴─────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
// Allow common clippy pedantic lints
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]
#![allow(missing_docs)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the tap
pub mod error;

/// Common types and type aliases
pub mod types;

/// Tap configuration
pub mod config;

/// Authentication implementations
pub mod auth;

/// HTTP client with retry and rate limiting
pub mod http;

/// Response decoders
pub mod decode;

/// Pagination strategies
pub mod pagination;

/// Field descriptors, JSON schemas and record mapping
pub mod schema;

/// Template interpolation
pub mod template;

/// Parent partition routing
pub mod partition;

/// Bookmark management and checkpointing
pub mod state;

/// Shared run context
pub mod context;

/// Stream definitions and per-instance sync
pub mod streams;

/// Catalog discovery and selection
pub mod catalog;

/// Message sinks
pub mod output;

/// Main execution engine
pub mod engine;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use config::TapConfig;
pub use engine::{CatalogRunner, Message, SyncSummary};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
