//! Registry server configuration

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use crate::registry::PresenceRegistry;

/// Environment variable overriding the bind address
pub const ADDR_ENV: &str = "TETHER_REGISTRY_ADDR";

/// Configuration for the registry server
#[derive(Clone, Debug)]
pub struct RegistryConfig {
    /// Address the RPC listener binds to
    pub bind_addr: SocketAddr,
    /// Directory for the registry log file
    pub log_dir: PathBuf,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            bind_addr: std::env::var(ADDR_ENV)
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], 10001))),
            log_dir: PathBuf::from("logs"),
        }
    }
}

/// App state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<PresenceRegistry>,
}
