//! Run context
//!
//! Everything a run shares, built once from the validated configuration and
//! passed explicitly to each component.

use crate::config::TapConfig;
use crate::error::Result;
use crate::http::HttpClient;
use crate::state::StateManager;
use std::sync::Arc;

/// Shared handles for one run
#[derive(Debug, Clone)]
pub struct RunContext {
    /// Validated configuration
    pub config: Arc<TapConfig>,
    /// Authenticated HTTP client
    pub client: Arc<HttpClient>,
    /// Bookmark store
    pub state: StateManager,
}

impl RunContext {
    /// Build the client from the configuration
    pub fn new(config: TapConfig, state: StateManager) -> Result<Self> {
        let client = HttpClient::with_auth(config.http_client_config(), config.auth_config())?;
        Ok(Self::with_client(config, client, state))
    }

    /// Use a prebuilt client
    pub fn with_client(config: TapConfig, client: HttpClient, state: StateManager) -> Self {
        Self {
            config: Arc::new(config),
            client: Arc::new(client),
            state,
        }
    }
}
