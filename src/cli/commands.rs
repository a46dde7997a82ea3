//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Singer tap for the Faethm API
#[derive(Parser, Debug)]
#[command(name = "tap-faethm")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (JSON, or YAML for .yaml/.yml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Inline config JSON
    #[arg(long, global = true)]
    pub config_json: Option<String>,

    /// State file (JSON), rewritten as the sync progresses
    #[arg(short, long, global = true)]
    pub state: Option<PathBuf>,

    /// Inline state JSON
    #[arg(long, global = true)]
    pub state_json: Option<String>,

    /// Catalog file selecting streams and fields
    #[arg(long, global = true)]
    pub catalog: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Show the configuration specification
    Spec,

    /// Validate the config and test the connection
    Check,

    /// Print the catalog of available streams
    Discover,

    /// Extract data from the selected streams
    Sync {
        /// Streams to sync (comma-separated, empty = all selected)
        #[arg(long)]
        streams: Option<String>,
    },
}

/// Split a comma-separated stream list, ignoring blanks
pub fn parse_stream_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(ToString::to_string)
        .collect()
}
