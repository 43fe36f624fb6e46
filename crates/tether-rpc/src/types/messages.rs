//! Request and reply bodies for both services.

use serde::{Deserialize, Serialize};

use super::{ConversationId, Endpoint, EndpointSet};

/// Body of `Find` and `Logout`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenRequest {
    pub token: String,
}

/// Body of `Login`, `JoinRoom` and `LeaveRoom`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BindRequest {
    pub token: String,
    pub endpoint: Endpoint,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FindReply {
    pub found: bool,
    pub endpoints: EndpointSet,
}

impl FindReply {
    pub fn missing() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ack {
    pub ok: bool,
}

impl Ack {
    pub fn ok() -> Self {
        Self { ok: true }
    }
}

/// Reply to `JoinRoom`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinReply {
    pub ok: bool,
    /// This join brought the room into existence
    pub created: bool,
}

/// Body of `GetVersion` and `GetHistorySnapshot`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationRequest {
    pub conversation: ConversationId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionReply {
    pub version: u64,
}

/// Full history of a conversation together with the ledger value it was
/// read at.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: u64,
    pub history: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppendRequest {
    pub conversation: ConversationId,
    pub message: String,
}
