//! HTTP client module
//!
//! Provides the HTTP client adapter with retry, request spacing, and backoff.
//!
//! # Features
//!
//! - **Automatic Retries**: 429, timeouts, connection failures and 5xx are
//!   retried with backoff up to a bounded attempt count
//! - **Request Spacing**: Minimum delay between requests using governor
//! - **Backoff Strategies**: Constant and exponential backoff
//! - **Error Classification**: 401/403 surface as auth errors, other 4xx are
//!   never retried

mod client;
mod rate_limit;

pub use client::{HttpClient, HttpClientConfig, HttpClientConfigBuilder, JsonResponse, RequestConfig};
pub use rate_limit::{RateLimiter, RateLimiterConfig};
