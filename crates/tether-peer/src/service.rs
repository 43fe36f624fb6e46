//! Peer RPC service: what other peers call on us

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use tether_rpc::protocol::routes;
use tether_rpc::types::messages::{Ack, AppendRequest, ConversationRequest, VersionReply};
use tether_rpc::{ConversationId, Snapshot};
use tokio::net::TcpListener;
use tracing::{debug, info};

use crate::config::PeerState;
use crate::error::{PeerError, Result};
use crate::ledger::Ledger;

/// A message appended by another peer
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub conversation: ConversationId,
    pub message: String,
    pub version: u64,
}

fn check_conversation(ledger: &Ledger, conversation: &ConversationId) -> Result<()> {
    if ledger.accepts(conversation) {
        Ok(())
    } else {
        Err(PeerError::ForeignConversation {
            conversation: conversation.clone(),
            identity: ledger.identity().to_string(),
        })
    }
}

/// POST /peer/version
pub async fn get_version(
    State(state): State<PeerState>,
    Json(req): Json<ConversationRequest>,
) -> Result<Json<VersionReply>> {
    check_conversation(&state.ledger, &req.conversation)?;
    let version = state.ledger.version(&req.conversation).await?;
    debug!("version of {} requested: {}", req.conversation, version);
    Ok(Json(VersionReply { version }))
}

/// POST /peer/history
pub async fn get_history(
    State(state): State<PeerState>,
    Json(req): Json<ConversationRequest>,
) -> Result<Json<Snapshot>> {
    check_conversation(&state.ledger, &req.conversation)?;
    let snapshot = state.ledger.snapshot(&req.conversation).await?;
    info!(
        "Serving history of {} at version {}",
        req.conversation, snapshot.version
    );
    Ok(Json(snapshot))
}

/// POST /peer/append
pub async fn append(
    State(state): State<PeerState>,
    Json(req): Json<AppendRequest>,
) -> Result<Json<Ack>> {
    check_conversation(&state.ledger, &req.conversation)?;
    let version = state.ledger.append(&req.conversation, &req.message).await?;
    info!(target: "chat", "[{}] {}", req.conversation, req.message);

    // No subscriber just means nobody is watching the console
    let _ = state.inbound.send(InboundMessage {
        conversation: req.conversation,
        message: req.message,
        version,
    });
    Ok(Json(Ack::ok()))
}

pub async fn health_check() -> &'static str {
    "OK - Tether Peer"
}

pub fn router(state: PeerState) -> Router {
    Router::new()
        .route(routes::VERSION, post(get_version))
        .route(routes::HISTORY, post(get_history))
        .route(routes::APPEND, post(append))
        .route(routes::HEALTH, get(health_check))
        .with_state(state)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Serve the peer service on an already bound listener
pub async fn serve(listener: TcpListener, state: PeerState) -> anyhow::Result<()> {
    axum::serve(listener, router(state)).await?;
    Ok(())
}

