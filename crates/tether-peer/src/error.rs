use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::path::PathBuf;
use tether_rpc::protocol::ErrorBody;
use tether_rpc::{ConversationId, RpcError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PeerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt ledger at {path:?}: {value:?}")]
    CorruptLedger { path: PathBuf, value: String },

    #[error("No such user '{0}'")]
    NoSuchUser(String),

    #[error("{conversation} is not a conversation of '{identity}'")]
    ForeignConversation {
        conversation: ConversationId,
        identity: String,
    },

    #[error("Already in {0}; quit first")]
    AlreadyActive(ConversationId),

    #[error("Not in a conversation")]
    NotActive,

    #[error("Registry error: {0}")]
    Registry(#[from] RpcError),
}

pub type Result<T> = core::result::Result<T, PeerError>;

impl IntoResponse for PeerError {
    fn into_response(self) -> Response {
        let status = match &self {
            PeerError::Io(_) | PeerError::CorruptLedger { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            PeerError::ForeignConversation { .. } => StatusCode::BAD_REQUEST,
            PeerError::Registry(_) => StatusCode::BAD_GATEWAY,
            PeerError::NoSuchUser(_) | PeerError::AlreadyActive(_) | PeerError::NotActive => {
                StatusCode::CONFLICT
            }
        };

        (status, Json(ErrorBody::new(self.to_string()))).into_response()
    }
}
