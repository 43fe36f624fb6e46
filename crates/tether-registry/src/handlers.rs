//! RPC handlers for the registry service

use axum::{extract::State, Json};
use tether_rpc::types::messages::{Ack, BindRequest, JoinReply, TokenRequest};
use tether_rpc::FindReply;
use tracing::debug;

use crate::config::AppState;
use crate::error::Result;

/// POST /registry/find
pub async fn find(
    State(state): State<AppState>,
    Json(req): Json<TokenRequest>,
) -> Json<FindReply> {
    debug!("find {}", req.token);
    Json(state.registry.find(&req.token))
}

/// POST /registry/login
pub async fn login(State(state): State<AppState>, Json(req): Json<BindRequest>) -> Json<Ack> {
    state.registry.login(&req.token, req.endpoint);
    Json(Ack::ok())
}

/// POST /registry/logout
pub async fn logout(
    State(state): State<AppState>,
    Json(req): Json<TokenRequest>,
) -> Result<Json<Ack>> {
    state.registry.logout(&req.token)?;
    Ok(Json(Ack::ok()))
}

/// POST /registry/join-room
pub async fn join_room(
    State(state): State<AppState>,
    Json(req): Json<BindRequest>,
) -> Json<JoinReply> {
    let created = state.registry.join_room(&req.token, req.endpoint);
    Json(JoinReply { ok: true, created })
}

/// POST /registry/leave-room
pub async fn leave_room(
    State(state): State<AppState>,
    Json(req): Json<BindRequest>,
) -> Result<Json<Ack>> {
    state.registry.leave_room(&req.token, &req.endpoint)?;
    Ok(Json(Ack::ok()))
}

pub async fn health_check() -> &'static str {
    "OK - Tether Registry"
}
