//! CLI module
//!
//! Command-line interface of the tap.
//!
//! # Commands
//!
//! - `spec` - Print the configuration schema
//! - `check` - Validate the config and test the connection
//! - `discover` - Print the catalog
//! - `sync` - Extract the selected streams to stdout

mod commands;
mod runner;

pub use commands::{parse_stream_list, Cli, Commands};
pub use runner::Runner;
