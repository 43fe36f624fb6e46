//! History reconciliation on conversation entry
//!
//! Pull-from-most-advanced-replica: ask every other member for its ledger
//! value and, if one is ahead of us, replace our history with its snapshot.
//! Divergent histories are not merged; the snapshot pulled wins.

use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tether_rpc::{ConversationId, Endpoint, PeerNetwork};
use tracing::{info, warn};

use crate::error::Result;
use crate::ledger::Ledger;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionSource {
    Local,
    Remote(Endpoint),
}

/// Outcome of one reconciliation pass
#[derive(Debug, Clone)]
pub struct Reconciliation {
    /// Ledger value before reconciling
    pub local_version: u64,
    /// Ledger value after reconciling
    pub version: u64,
    pub source: VersionSource,
    /// Local history after reconciling, for display
    pub history: String,
    /// Endpoints that could not be queried
    pub skipped: Vec<Endpoint>,
}

pub struct Reconciler {
    ledger: Arc<Ledger>,
    network: Arc<dyn PeerNetwork>,
    local: Endpoint,
    concurrency: usize,
}

impl Reconciler {
    pub fn new(
        ledger: Arc<Ledger>,
        network: Arc<dyn PeerNetwork>,
        local: Endpoint,
        concurrency: usize,
    ) -> Self {
        Self {
            ledger,
            network,
            local,
            concurrency: concurrency.max(1),
        }
    }

    pub async fn reconcile(
        &self,
        conversation: &ConversationId,
        endpoints: &[Endpoint],
    ) -> Result<Reconciliation> {
        let local_version = self.ledger.open(conversation).await?;

        let network = &self.network;
        let replies: Vec<(Endpoint, tether_rpc::Result<u64>)> = stream::iter(
            endpoints.iter().filter(|ep| **ep != self.local),
        )
        .map(|ep| async move { (ep.clone(), network.get_version(ep, conversation).await) })
        .buffered(self.concurrency)
        .collect()
        .await;

        // Folded in endpoint set order; the first endpoint to reach a maximum wins.
        let mut best_version = local_version;
        let mut source = VersionSource::Local;
        let mut skipped = Vec::new();
        for (endpoint, reply) in replies {
            match reply {
                Ok(version) if version > best_version => {
                    best_version = version;
                    source = VersionSource::Remote(endpoint);
                }
                Ok(_) => {}
                Err(e) => {
                    warn!("Skipping {} while reconciling {}: {}", endpoint, conversation, e);
                    skipped.push(endpoint);
                }
            }
        }

        let snapshot = match source.clone() {
            VersionSource::Remote(endpoint) => {
                match self.network.get_history(&endpoint, conversation).await {
                    Ok(snapshot) => Some(snapshot),
                    Err(e) => {
                        warn!(
                            "Snapshot fetch from {} failed for {}, keeping local history: {}",
                            endpoint, conversation, e
                        );
                        skipped.push(endpoint);
                        source = VersionSource::Local;
                        None
                    }
                }
            }
            VersionSource::Local => None,
        };

        let version = self.ledger.adopt(conversation, snapshot).await?;
        let history = self.ledger.history(conversation).await?;

        info!(
            "Reconciled {}: {} -> {} ({:?})",
            conversation, local_version, version, source
        );

        Ok(Reconciliation {
            local_version,
            version,
            source,
            history,
            skipped,
        })
    }
}
