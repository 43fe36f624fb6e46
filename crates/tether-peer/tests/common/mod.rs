//! In-process peer network for scenario tests.
//!
//! Endpoints map straight onto real `Ledger`s; any endpoint can be marked
//! unreachable to simulate a dead peer.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tether_peer::{Ledger, Session};
use tether_registry::PresenceRegistry;
use tether_rpc::{ConversationId, Endpoint, PeerNetwork, RpcError, Snapshot};

#[derive(Default)]
pub struct LoopbackNetwork {
    peers: Mutex<HashMap<Endpoint, Arc<Ledger>>>,
    unreachable: Mutex<HashSet<Endpoint>>,
    /// Endpoints that answer version queries but fail history fetches
    history_down: Mutex<HashSet<Endpoint>>,
}

impl LoopbackNetwork {
    pub fn attach(&self, endpoint: Endpoint, ledger: Arc<Ledger>) {
        self.peers.lock().unwrap().insert(endpoint, ledger);
    }

    pub fn set_unreachable(&self, endpoint: &Endpoint) {
        self.unreachable.lock().unwrap().insert(endpoint.clone());
    }

    pub fn fail_history(&self, endpoint: &Endpoint) {
        self.history_down.lock().unwrap().insert(endpoint.clone());
    }

    fn ledger(&self, endpoint: &Endpoint) -> tether_rpc::Result<Arc<Ledger>> {
        if self.unreachable.lock().unwrap().contains(endpoint) {
            return Err(RpcError::Unreachable(endpoint.to_string()));
        }
        self.peers
            .lock()
            .unwrap()
            .get(endpoint)
            .cloned()
            .ok_or_else(|| RpcError::Unreachable(endpoint.to_string()))
    }
}

fn rejected(e: tether_peer::PeerError) -> RpcError {
    RpcError::Rejected {
        status: 500,
        message: e.to_string(),
    }
}

#[async_trait]
impl PeerNetwork for LoopbackNetwork {
    async fn get_version(
        &self,
        endpoint: &Endpoint,
        conversation: &ConversationId,
    ) -> tether_rpc::Result<u64> {
        let ledger = self.ledger(endpoint)?;
        ledger.version(conversation).await.map_err(rejected)
    }

    async fn get_history(
        &self,
        endpoint: &Endpoint,
        conversation: &ConversationId,
    ) -> tether_rpc::Result<Snapshot> {
        if self.history_down.lock().unwrap().contains(endpoint) {
            return Err(RpcError::Timeout);
        }
        let ledger = self.ledger(endpoint)?;
        ledger.snapshot(conversation).await.map_err(rejected)
    }

    async fn append(
        &self,
        endpoint: &Endpoint,
        conversation: &ConversationId,
        message: &str,
    ) -> tether_rpc::Result<()> {
        let ledger = self.ledger(endpoint)?;
        ledger
            .append(conversation, message)
            .await
            .map(|_| ())
            .map_err(rejected)
    }
}

pub struct Peer {
    pub session: Session,
    pub ledger: Arc<Ledger>,
    pub endpoint: Endpoint,
}

/// One registry, one shared data root, any number of peers
pub struct Harness {
    pub root: TempDir,
    pub registry: Arc<PresenceRegistry>,
    pub network: Arc<LoopbackNetwork>,
    next_port: u16,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            root: TempDir::new().unwrap(),
            registry: Arc::new(PresenceRegistry::new()),
            network: Arc::new(LoopbackNetwork::default()),
            next_port: 40001,
        }
    }

    pub async fn peer(&mut self, name: &str) -> Peer {
        let endpoint = Endpoint::new("127.0.0.1", self.next_port);
        self.next_port += 1;

        let ledger = Arc::new(Ledger::new(name, self.root.path()));
        self.network.attach(endpoint.clone(), ledger.clone());

        let session = Session::new(
            endpoint.clone(),
            ledger.clone(),
            self.registry.clone(),
            self.network.clone(),
            4,
        );
        session.login().await.unwrap();

        Peer {
            session,
            ledger,
            endpoint,
        }
    }
}
