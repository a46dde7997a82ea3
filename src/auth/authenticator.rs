//! Authenticator implementation
//!
//! Applies the configured credential plus the JSON content headers the
//! Faethm API requires to every outgoing request.

use super::types::AuthConfig;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::RequestBuilder;

/// Authenticator handles applying authentication to HTTP requests
#[derive(Debug, Clone, Default)]
pub struct Authenticator {
    /// Auth configuration
    config: AuthConfig,
}

impl Authenticator {
    /// Create a new authenticator with the given config
    pub fn new(config: AuthConfig) -> Self {
        Self { config }
    }

    /// The auth configuration in use
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Apply authentication to a request builder
    pub fn apply(&self, req: RequestBuilder) -> RequestBuilder {
        let req = req
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json");

        match &self.config {
            AuthConfig::None => req,
            AuthConfig::Bearer { token } => req.bearer_auth(token),
        }
    }
}
