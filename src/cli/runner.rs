//! CLI runner - executes commands

use crate::catalog::{discover, Catalog, Selection};
use crate::cli::commands::{parse_stream_list, Cli, Commands};
use crate::config::{config_spec, TapConfig};
use crate::context::RunContext;
use crate::engine::{CatalogRunner, InstanceStatus};
use crate::error::{Error, Result};
use crate::http::RequestConfig;
use crate::output::JsonLinesSink;
use crate::state::StateManager;
use crate::streams::{faethm_streams, StreamGraph};
use serde_json::{json, Value};
use tracing::{error, info};

/// Endpoint requested by `check`
const CHECK_PATH: &str = "/industries";

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    ///
    /// A sync with failed stream instances returns [`Error::SyncFailed`]
    /// after all its output has been written.
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Spec => self.spec(),
            Commands::Check => self.check().await,
            Commands::Discover => self.discover(),
            Commands::Sync { streams } => self.sync(streams.as_deref()).await,
        }
    }

    /// Load configuration; inline JSON takes precedence over the file
    fn load_config(&self) -> Result<TapConfig> {
        if let Some(json_str) = &self.cli.config_json {
            return TapConfig::from_json_str(json_str);
        }
        if let Some(path) = &self.cli.config {
            return TapConfig::from_file(path);
        }
        Err(Error::config(
            "No configuration given, use --config or --config-json",
        ))
    }

    /// Load state
    fn load_state(&self) -> Result<StateManager> {
        // Inline state takes precedence
        if let Some(state_json) = &self.cli.state_json {
            StateManager::from_json(state_json)
        } else if let Some(path) = &self.cli.state {
            StateManager::from_file(path)
        } else {
            Ok(StateManager::in_memory())
        }
    }

    /// Selection from the catalog, or everything without one
    fn load_selection(&self, graph: &StreamGraph) -> Result<Selection> {
        match &self.cli.catalog {
            Some(path) => Ok(Selection::from_catalog(&Catalog::from_file(path)?, graph)),
            None => Ok(Selection::all(graph)),
        }
    }

    /// Show spec
    fn spec(&self) -> Result<()> {
        self.output_pretty(&config_spec());
        Ok(())
    }

    /// Check connection
    async fn check(&self) -> Result<()> {
        let config = self.load_config()?;
        info!(url = %config.api_base_url, "Checking connection");

        let ctx = RunContext::new(config, StateManager::in_memory())?;
        match ctx
            .client
            .get_json_with_config(CHECK_PATH, RequestConfig::new())
            .await
        {
            Ok(_) => {
                self.output_message(&json!({
                    "type": "CONNECTION_STATUS",
                    "connectionStatus": {
                        "status": "SUCCEEDED",
                        "message": "Connection successful"
                    }
                }));
                Ok(())
            }
            Err(e) => {
                self.output_message(&json!({
                    "type": "CONNECTION_STATUS",
                    "connectionStatus": {
                        "status": "FAILED",
                        "message": format!("Connection failed: {e}")
                    }
                }));
                Err(e)
            }
        }
    }

    /// Discover streams
    fn discover(&self) -> Result<()> {
        let graph = StreamGraph::new(faethm_streams())?;
        self.output_pretty(&discover(&graph).to_json());
        Ok(())
    }

    /// Sync the selected streams
    async fn sync(&self, streams: Option<&str>) -> Result<()> {
        let config = self.load_config()?;
        let state = self.load_state()?;
        let graph = StreamGraph::new(faethm_streams())?;

        let mut selection = self.load_selection(&graph)?;
        if let Some(list) = streams {
            let names = parse_stream_list(list);
            if !names.is_empty() {
                selection = selection.restrict(&names, &graph)?;
            }
        }
        info!(streams = ?selection.selected(), "Starting sync");

        let ctx = RunContext::new(config, state)?;
        let mut runner = CatalogRunner::new(ctx, graph, selection, JsonLinesSink::stdout());
        let summary = runner.run().await?;

        let failed = summary
            .instances
            .iter()
            .filter(|i| i.status == InstanceStatus::Failed)
            .count();
        if failed > 0 {
            for instance in summary
                .instances
                .iter()
                .filter(|i| i.status == InstanceStatus::Failed)
            {
                error!(
                    stream = %instance.stream,
                    parent = ?instance.parent_id,
                    "{}",
                    instance.error.as_deref().unwrap_or("unknown error")
                );
            }
            return Err(Error::SyncFailed { failed });
        }
        Ok(())
    }

    fn output_message(&self, msg: &Value) {
        println!("{}", serde_json::to_string(msg).unwrap_or_default());
    }

    fn output_pretty(&self, msg: &Value) {
        println!("{}", serde_json::to_string_pretty(msg).unwrap_or_default());
    }
}
