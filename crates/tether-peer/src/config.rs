//! Peer configuration

use std::path::PathBuf;
use std::sync::Arc;
use tether_rpc::ClientConfig;
use tokio::sync::broadcast;

use crate::ledger::Ledger;
use crate::service::InboundMessage;

/// Environment variable overriding the registry URL
pub const REGISTRY_URL_ENV: &str = "TETHER_REGISTRY_URL";

#[derive(Clone, Debug)]
pub struct PeerConfig {
    /// Root of all per-identity data
    pub data_root: PathBuf,
    pub registry_url: String,
    /// Host the peer service binds to and advertises
    pub host: String,
    /// 0 lets the OS pick a port
    pub port: u16,
    /// Upper bound on in-flight peer RPCs during fan-out and reconciliation
    pub fanout_concurrency: usize,
    pub client: ClientConfig,
}

impl Default for PeerConfig {
    fn default() -> Self {
        Self {
            data_root: tether_common::tether_root(),
            registry_url: std::env::var(REGISTRY_URL_ENV)
                .unwrap_or_else(|_| "http://127.0.0.1:10001".to_string()),
            host: "127.0.0.1".to_string(),
            port: 0,
            fanout_concurrency: 8,
            client: ClientConfig::default(),
        }
    }
}

impl PeerConfig {
    /// Create config with a specific data root (for tests)
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_root: base_dir.into(),
            ..Default::default()
        }
    }
}

/// State shared by the peer service handlers
#[derive(Clone)]
pub struct PeerState {
    pub ledger: Arc<Ledger>,
    pub inbound: broadcast::Sender<InboundMessage>,
}

impl PeerState {
    pub fn new(ledger: Arc<Ledger>) -> Self {
        let (inbound, _) = broadcast::channel(100);
        Self { ledger, inbound }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<InboundMessage> {
        self.inbound.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_base_dir() {
        let config = PeerConfig::with_base_dir("/tmp/tether-test");
        assert_eq!(config.data_root, PathBuf::from("/tmp/tether-test"));
        assert_eq!(config.port, 0);
        assert_eq!(config.fanout_concurrency, 8);
    }
}
