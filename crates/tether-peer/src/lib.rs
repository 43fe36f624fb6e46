//! Tether Peer
//!
//! Every chat client is also a server: it keeps a version ledger and a
//! message log per conversation, answers version/history/append calls from
//! other peers, and relays its own user's messages to the current members.

pub mod config;
pub mod console;
pub mod error;
pub mod ledger;
pub mod reconcile;
pub mod relay;
pub mod service;

use std::sync::Arc;
use tether_rpc::{Endpoint, HttpPeerNetwork, HttpRegistry};
use tokio::net::TcpListener;
use tracing::{error, info};

pub use config::{PeerConfig, PeerState};
pub use console::Console;
pub use error::PeerError;
pub use ledger::Ledger;
pub use reconcile::{Reconciler, Reconciliation, VersionSource};
pub use relay::{Benchmark, Delivery, Entry, Session, SessionState};
pub use service::InboundMessage;

/// Bind the peer service, spawn it, and build a session wired to HTTP
/// clients. The caller logs the session in.
pub async fn start(config: &PeerConfig, identity: &str) -> anyhow::Result<(Session, PeerState)> {
    tether_common::init_structure(&config.data_root, identity)?;

    let listener = TcpListener::bind((config.host.as_str(), config.port)).await?;
    let endpoint = Endpoint::new(config.host.clone(), listener.local_addr()?.port());
    info!("Peer service for {} listening on {}", identity, endpoint);

    let ledger = Arc::new(Ledger::new(identity, config.data_root.clone()));
    let state = PeerState::new(ledger.clone());

    let served = state.clone();
    tokio::spawn(async move {
        if let Err(e) = service::serve(listener, served).await {
            error!("Peer service crashed: {}", e);
        }
    });

    let registry = Arc::new(HttpRegistry::new(config.registry_url.clone(), &config.client)?);
    let network = Arc::new(HttpPeerNetwork::new(&config.client)?);
    let session = Session::new(
        endpoint,
        ledger,
        registry,
        network,
        config.fanout_concurrency,
    );

    Ok((session, state))
}
