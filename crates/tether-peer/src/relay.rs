//! Relay session: the foreground side of a peer
//!
//! Owns the `Idle` / `Active` state, talks to the registry on entry and exit,
//! and fans each outgoing message out to the conversation's current members.

use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tether_rpc::{ConversationId, Endpoint, PeerNetwork, RegistryApi};
use tracing::{info, warn};

use crate::error::{PeerError, Result};
use crate::ledger::Ledger;
use crate::reconcile::{Reconciler, Reconciliation};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Active(ConversationId),
}

/// Result of entering a conversation
#[derive(Debug, Clone)]
pub struct Entry {
    pub conversation: ConversationId,
    /// The room did not exist in the registry before this peer joined it
    pub created: bool,
    pub reconciliation: Reconciliation,
}

/// Result of sending one message
#[derive(Debug, Clone, Default)]
pub struct Delivery {
    /// Local ledger value after the self-delivery
    pub version: u64,
    pub delivered: Vec<Endpoint>,
    pub failed: Vec<Endpoint>,
}

#[derive(Debug, Clone, Copy)]
pub struct Benchmark {
    pub rounds: u32,
    pub total: Duration,
    /// Remote deliveries that failed across all rounds
    pub failures: usize,
}

impl Benchmark {
    pub fn mean(&self) -> Duration {
        self.total / self.rounds.max(1)
    }
}

pub struct Session {
    identity: String,
    endpoint: Endpoint,
    ledger: Arc<Ledger>,
    registry: Arc<dyn RegistryApi>,
    network: Arc<dyn PeerNetwork>,
    reconciler: Reconciler,
    fanout_concurrency: usize,
    state: SessionState,
}

impl Session {
    pub fn new(
        endpoint: Endpoint,
        ledger: Arc<Ledger>,
        registry: Arc<dyn RegistryApi>,
        network: Arc<dyn PeerNetwork>,
        fanout_concurrency: usize,
    ) -> Self {
        let fanout_concurrency = fanout_concurrency.max(1);
        let reconciler = Reconciler::new(
            ledger.clone(),
            network.clone(),
            endpoint.clone(),
            fanout_concurrency,
        );

        Self {
            identity: ledger.identity().to_string(),
            endpoint,
            ledger,
            registry,
            network,
            reconciler,
            fanout_concurrency,
            state: SessionState::Idle,
        }
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn active(&self) -> Option<&ConversationId> {
        match &self.state {
            SessionState::Active(conversation) => Some(conversation),
            SessionState::Idle => None,
        }
    }

    fn ensure_idle(&self) -> Result<()> {
        match &self.state {
            SessionState::Idle => Ok(()),
            SessionState::Active(conversation) => {
                Err(PeerError::AlreadyActive(conversation.clone()))
            }
        }
    }

    /// Registry token whose endpoint set receives messages for `conversation`
    fn token_for<'a>(&'a self, conversation: &'a ConversationId) -> Result<&'a str> {
        match conversation {
            ConversationId::Room { name } => Ok(name.as_str()),
            ConversationId::Personal { .. } => conversation
                .counterpart(&self.identity)
                .ok_or_else(|| PeerError::ForeignConversation {
                    conversation: conversation.clone(),
                    identity: self.identity.clone(),
                }),
        }
    }

    pub async fn login(&self) -> Result<()> {
        self.registry.login(&self.identity, &self.endpoint).await?;
        info!("Logged in as {} at {}", self.identity, self.endpoint);
        Ok(())
    }

    /// Leave the active room, if any, then drop our registry binding
    pub async fn logout(&mut self) -> Result<()> {
        if self.active().is_some() {
            if let Err(e) = self.quit().await {
                warn!("Failed to leave conversation during logout: {}", e);
            }
        }
        self.registry.logout(&self.identity).await?;
        info!("Logged out {}", self.identity);
        Ok(())
    }

    pub async fn enter_room(&mut self, room: &str) -> Result<Entry> {
        self.ensure_idle()?;
        let conversation = ConversationId::room(room);

        let created = self.registry.join_room(room, &self.endpoint).await?;

        let reconciliation = match self.reconcile_members(room, &conversation).await {
            Ok(reconciliation) => reconciliation,
            Err(e) => {
                // Still Idle, so nothing else would ever remove this membership
                if let Err(leave) = self.registry.leave_room(room, &self.endpoint).await {
                    warn!("Failed to leave {} after aborted entry: {}", room, leave);
                }
                return Err(e);
            }
        };

        if created {
            info!("Created room {}", room);
        } else {
            info!("Joined room {}", room);
        }
        self.state = SessionState::Active(conversation.clone());

        Ok(Entry {
            conversation,
            created,
            reconciliation,
        })
    }

    async fn reconcile_members(
        &self,
        room: &str,
        conversation: &ConversationId,
    ) -> Result<Reconciliation> {
        let members = self.registry.find(room).await?;
        self.reconciler
            .reconcile(conversation, &members.endpoints)
            .await
    }

    pub async fn enter_personal(&mut self, peer: &str) -> Result<Entry> {
        self.ensure_idle()?;

        // A user token maps to exactly one endpoint; anything else is a room
        let reply = self.registry.find(peer).await?;
        if !reply.found || reply.endpoints.len() != 1 {
            return Err(PeerError::NoSuchUser(peer.to_string()));
        }

        let conversation = ConversationId::personal(self.identity.clone(), peer);
        let reconciliation = self
            .reconciler
            .reconcile(&conversation, &reply.endpoints)
            .await?;

        info!("Started personal chat with {}", peer);
        self.state = SessionState::Active(conversation.clone());

        Ok(Entry {
            conversation,
            created: false,
            reconciliation,
        })
    }

    /// Deliver `text` locally, then to every other current member.
    ///
    /// Remote failures are logged and reported, never propagated.
    pub async fn send(&self, text: &str) -> Result<Delivery> {
        let conversation = self.active().ok_or(PeerError::NotActive)?;
        let token = self.token_for(conversation)?;

        // Membership may have changed since entry
        let members = self.registry.find(token).await?;
        let message = format!("{}: {}", self.identity, text);

        let version = self.ledger.append(conversation, &message).await?;

        let network = &self.network;
        let message = message.as_str();
        let results: Vec<(Endpoint, tether_rpc::Result<()>)> = stream::iter(
            members
                .endpoints
                .iter()
                .filter(|ep| **ep != self.endpoint),
        )
        .map(|ep| async move { (ep.clone(), network.append(ep, conversation, message).await) })
        .buffered(self.fanout_concurrency)
        .collect()
        .await;

        let mut delivery = Delivery {
            version,
            ..Default::default()
        };
        for (endpoint, result) in results {
            match result {
                Ok(()) => delivery.delivered.push(endpoint),
                Err(e) => {
                    warn!("Delivery of {} to {} failed: {}", conversation, endpoint, e);
                    delivery.failed.push(endpoint);
                }
            }
        }

        Ok(delivery)
    }

    /// Leave the active conversation and return to `Idle`
    pub async fn quit(&mut self) -> Result<ConversationId> {
        let conversation = match std::mem::replace(&mut self.state, SessionState::Idle) {
            SessionState::Active(conversation) => conversation,
            SessionState::Idle => return Err(PeerError::NotActive),
        };

        if let ConversationId::Room { name } = &conversation {
            self.registry.leave_room(name, &self.endpoint).await?;
            info!("Left room {}", name);
        }

        Ok(conversation)
    }

    /// Send `rounds` numbered messages through the normal relay path
    pub async fn benchmark(&self, rounds: u32) -> Result<Benchmark> {
        let start = Instant::now();
        let mut failures = 0;
        for round in 0..rounds {
            let delivery = self.send(&format!("bench {}", round)).await?;
            failures += delivery.failed.len();
        }
        let report = Benchmark {
            rounds,
            total: start.elapsed(),
            failures,
        };

        info!(
            "Benchmark: {} rounds in {:?}, mean {:?}",
            rounds,
            report.total,
            report.mean()
        );
        Ok(report)
    }
}
