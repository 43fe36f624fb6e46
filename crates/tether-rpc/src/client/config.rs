//! Configuration for the Tether HTTP clients.

use std::time::Duration;

use crate::error::{Result, RpcError};

/// Configuration for the Tether HTTP clients.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
    /// Request timeout in milliseconds.
    pub request_timeout_ms: u64,
    /// Connection timeout in milliseconds.
    pub connect_timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            request_timeout_ms: 5000,
            connect_timeout_ms: 2000,
        }
    }
}

impl ClientConfig {
    /// Build the underlying HTTP client. Requests are never retried.
    pub fn build(&self) -> Result<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(Duration::from_millis(self.request_timeout_ms))
            .connect_timeout(Duration::from_millis(self.connect_timeout_ms))
            .build()
            .map_err(|e| RpcError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.request_timeout_ms, 5000);
        assert_eq!(config.connect_timeout_ms, 2000);
        assert!(config.build().is_ok());
    }
}
