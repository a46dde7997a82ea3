//! Authentication module
//!
//! The Faethm API expects the API key as a bearer token.

mod authenticator;
mod types;

pub use authenticator::Authenticator;
pub use types::AuthConfig;
