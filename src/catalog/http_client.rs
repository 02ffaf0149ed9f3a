//! HTTP client construction policy for catalog requests.
//!
//! Centralizes timeout, user-agent, and compression defaults so every
//! catalog client is built the same way.

use std::time::Duration;

use reqwest::Client;

use crate::user_agent;

use super::LookupError;

/// Default connect timeout in seconds.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default total request timeout in seconds.
pub const DEFAULT_READ_TIMEOUT_SECS: u64 = 30;

/// Connect and total-request timeouts for catalog requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpTimeouts {
    pub connect_secs: u64,
    pub read_secs: u64,
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        Self {
            connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            read_secs: DEFAULT_READ_TIMEOUT_SECS,
        }
    }
}

/// Builds the catalog HTTP client.
///
/// # Errors
///
/// Returns [`LookupError::Failed`] when the TLS backend or proxy
/// configuration prevents client construction.
pub fn build_catalog_http_client(timeouts: HttpTimeouts) -> Result<Client, LookupError> {
    Client::builder()
        .connect_timeout(Duration::from_secs(timeouts.connect_secs))
        .timeout(Duration::from_secs(timeouts.read_secs))
        .user_agent(user_agent::default_catalog_user_agent())
        .gzip(true)
        .build()
        .map_err(|error| {
            LookupError::failed_with_suggestion(
                "<client>",
                &format!("HTTP client construction failed: {error}"),
                "Check proxy environment variables and TLS configuration",
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_timeouts() {
        let timeouts = HttpTimeouts::default();
        assert_eq!(timeouts.connect_secs, 10);
        assert_eq!(timeouts.read_secs, 30);
    }

    #[test]
    fn test_build_catalog_http_client_succeeds_with_defaults() {
        assert!(build_catalog_http_client(HttpTimeouts::default()).is_ok());
    }
}
