//! Tap configuration
//!
//! The configuration is read once at startup (JSON or YAML file, or inline
//! JSON), validated, and then passed read-only to every component that needs
//! it. Missing required fields fail before any network I/O happens.

use crate::auth::AuthConfig;
use crate::error::{Error, Result};
use crate::http::{HttpClientConfig, RateLimiterConfig};
use crate::types::{BackoffType, OptionStringExt};
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Base URL used when `api_base_url` is not configured
pub const DEFAULT_API_BASE_URL: &str = "https://api.faethm.ai/di/v1";

/// Default number of records requested per page on paginated endpoints
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// Default per-request timeout (five minutes)
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 300;

/// Default minimum spacing between two requests
pub const DEFAULT_RATE_LIMIT_DELAY_MS: u64 = 1000;

/// Default number of retries for transient failures
pub const DEFAULT_MAX_RETRIES: u32 = 5;

/// Configuration as it appears on disk; everything optional so that
/// validation can report precisely which field is missing.
#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    #[serde(default)]
    api_base_url: Option<String>,
    #[serde(default)]
    api_key: Option<String>,
    #[serde(default)]
    country_code: Option<String>,
    #[serde(default)]
    page_size: Option<u32>,
    #[serde(default)]
    request_timeout_secs: Option<u64>,
    #[serde(default)]
    rate_limit_delay_ms: Option<u64>,
    #[serde(default)]
    max_retries: Option<u32>,
    #[serde(default)]
    user_agent: Option<String>,
}

/// Validated tap configuration
#[derive(Clone)]
pub struct TapConfig {
    /// Base URL of the Faethm API
    pub api_base_url: String,
    /// API key sent as a bearer token
    pub api_key: String,
    /// Country the data is requested for
    pub country_code: String,
    /// Page size for endpoints that paginate with a limit
    pub page_size: u32,
    /// Per-request timeout
    pub request_timeout: Duration,
    /// Minimum delay between two requests
    pub rate_limit_delay: Duration,
    /// Retries for transient failures
    pub max_retries: u32,
    /// User agent override
    pub user_agent: Option<String>,
}

impl std::fmt::Debug for TapConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TapConfig")
            .field("api_base_url", &self.api_base_url)
            .field("api_key", &"***")
            .field("country_code", &self.country_code)
            .field("page_size", &self.page_size)
            .field("request_timeout", &self.request_timeout)
            .field("rate_limit_delay", &self.rate_limit_delay)
            .field("max_retries", &self.max_retries)
            .finish_non_exhaustive()
    }
}

impl TapConfig {
    /// Build a config from a JSON value
    pub fn from_value(value: Value) -> Result<Self> {
        if !value.is_object() {
            return Err(Error::config("Configuration must be a JSON object"));
        }
        let raw: RawConfig = serde_json::from_value(value)
            .map_err(|e| Error::config(format!("Invalid configuration: {e}")))?;
        Self::validate(raw)
    }

    /// Build a config from an inline JSON string
    pub fn from_json_str(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)
            .map_err(|e| Error::config(format!("Invalid config JSON: {e}")))?;
        Self::from_value(value)
    }

    /// Load a config file; `.yaml`/`.yml` files are parsed as YAML, anything else as JSON
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!(
                "Failed to read config file {}: {e}",
                path.display()
            ))
        })?;

        let is_yaml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));

        let value: Value = if is_yaml {
            serde_yaml::from_str(&contents)?
        } else {
            serde_json::from_str(&contents)
                .map_err(|e| Error::config(format!("Invalid config JSON: {e}")))?
        };
        Self::from_value(value)
    }

    fn validate(raw: RawConfig) -> Result<Self> {
        let api_key = raw
            .api_key
            .none_if_empty()
            .ok_or_else(|| Error::missing_field("api_key"))?;
        let country_code = raw
            .country_code
            .none_if_empty()
            .ok_or_else(|| Error::missing_field("country_code"))?;

        let api_base_url = raw
            .api_base_url
            .none_if_empty()
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());
        let parsed = Url::parse(&api_base_url)
            .map_err(|e| Error::invalid_value("api_base_url", e.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::invalid_value(
                "api_base_url",
                format!("unsupported scheme '{}'", parsed.scheme()),
            ));
        }

        let page_size = raw.page_size.unwrap_or(DEFAULT_PAGE_SIZE);
        if page_size == 0 {
            return Err(Error::invalid_value("page_size", "must be greater than 0"));
        }

        let request_timeout_secs = raw
            .request_timeout_secs
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);
        if request_timeout_secs == 0 {
            return Err(Error::invalid_value(
                "request_timeout_secs",
                "must be greater than 0",
            ));
        }

        Ok(Self {
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            api_key,
            country_code: country_code.trim().to_string(),
            page_size,
            request_timeout: Duration::from_secs(request_timeout_secs),
            rate_limit_delay: Duration::from_millis(
                raw.rate_limit_delay_ms
                    .unwrap_or(DEFAULT_RATE_LIMIT_DELAY_MS),
            ),
            max_retries: raw.max_retries.unwrap_or(DEFAULT_MAX_RETRIES),
            user_agent: raw.user_agent.none_if_empty(),
        })
    }

    /// HTTP client settings derived from this config
    pub fn http_client_config(&self) -> HttpClientConfig {
        let mut builder = HttpClientConfig::builder()
            .base_url(&self.api_base_url)
            .timeout(self.request_timeout)
            .max_retries(self.max_retries)
            .backoff(
                BackoffType::Exponential,
                Duration::from_secs(1),
                Duration::from_secs(60),
            );

        builder = if self.rate_limit_delay.is_zero() {
            builder.no_rate_limit()
        } else {
            builder.rate_limit(RateLimiterConfig::new(self.rate_limit_delay))
        };

        if let Some(agent) = &self.user_agent {
            builder = builder.user_agent(agent);
        }

        builder.build()
    }

    /// Authentication derived from this config
    pub fn auth_config(&self) -> AuthConfig {
        AuthConfig::bearer(&self.api_key)
    }
}

/// JSON schema describing the accepted configuration, printed by `spec`
pub fn config_spec() -> Value {
    json!({
        "type": "object",
        "title": "tap-faethm",
        "required": ["api_key", "country_code"],
        "properties": {
            "api_base_url": {
                "type": "string",
                "description": "Url base for the source endpoint",
                "default": DEFAULT_API_BASE_URL
            },
            "api_key": {
                "type": "string",
                "description": "API key",
                "secret": true
            },
            "country_code": {
                "type": "string",
                "description": "Country code for the data"
            },
            "page_size": {
                "type": "integer",
                "description": "Records per page on paginated endpoints",
                "default": DEFAULT_PAGE_SIZE
            },
            "request_timeout_secs": {
                "type": "integer",
                "default": DEFAULT_REQUEST_TIMEOUT_SECS
            },
            "rate_limit_delay_ms": {
                "type": "integer",
                "description": "Minimum delay between requests",
                "default": DEFAULT_RATE_LIMIT_DELAY_MS
            },
            "max_retries": {
                "type": "integer",
                "default": DEFAULT_MAX_RETRIES
            },
            "user_agent": {
                "type": "string"
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = TapConfig::from_value(json!({
            "api_key": "secret",
            "country_code": "AU"
        }))
        .unwrap();

        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(config.request_timeout, Duration::from_secs(300));
        assert_eq!(config.rate_limit_delay, Duration::from_secs(1));
        assert_eq!(config.max_retries, DEFAULT_MAX_RETRIES);
    }

    #[test]
    fn test_missing_api_key() {
        let err = TapConfig::from_value(json!({"country_code": "AU"})).unwrap_err();
        assert!(matches!(err, Error::MissingConfigField { ref field } if field == "api_key"));
    }

    #[test]
    fn test_blank_country_code_is_missing() {
        let err =
            TapConfig::from_value(json!({"api_key": "k", "country_code": "  "})).unwrap_err();
        assert!(matches!(err, Error::MissingConfigField { ref field } if field == "country_code"));
    }

    #[test]
    fn test_invalid_base_url() {
        let err = TapConfig::from_value(json!({
            "api_key": "k",
            "country_code": "AU",
            "api_base_url": "not a url"
        }))
        .unwrap_err();
        assert!(matches!(err, Error::InvalidConfigValue { ref field, .. } if field == "api_base_url"));
    }

    #[test]
    fn test_zero_page_size_rejected() {
        let err = TapConfig::from_value(json!({
            "api_key": "k",
            "country_code": "AU",
            "page_size": 0
        }))
        .unwrap_err();
        assert!(matches!(err, Error::InvalidConfigValue { ref field, .. } if field == "page_size"));
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let config = TapConfig::from_value(json!({
            "api_key": "k",
            "country_code": "AU",
            "api_base_url": "http://localhost:8080/v1/"
        }))
        .unwrap();
        assert_eq!(config.api_base_url, "http://localhost:8080/v1");
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = TapConfig::from_json_str(r#"{"api_key": "hunter2", "country_code": "AU"}"#)
            .unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_non_object_rejected() {
        assert!(TapConfig::from_json_str("[1, 2]").is_err());
    }

    #[test]
    fn test_from_yaml_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "api_key: abc\ncountry_code: NZ\npage_size: 10").unwrap();

        let config = TapConfig::from_file(file.path()).unwrap();
        assert_eq!(config.country_code, "NZ");
        assert_eq!(config.page_size, 10);
    }

    #[test]
    fn test_from_json_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"api_key": "abc", "country_code": "US", "rate_limit_delay_ms": 0}}"#)
            .unwrap();

        let config = TapConfig::from_file(file.path()).unwrap();
        assert_eq!(config.country_code, "US");
        assert!(config.rate_limit_delay.is_zero());
        assert!(config.http_client_config().rate_limit.is_none());
    }

    #[test]
    fn test_config_spec_lists_required_fields() {
        let spec = config_spec();
        assert_eq!(spec["required"], json!(["api_key", "country_code"]));
    }
}
