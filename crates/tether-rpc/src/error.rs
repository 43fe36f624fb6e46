//! Error types for Tether RPC operations.

use thiserror::Error;

/// Result type for Tether RPC operations.
pub type Result<T> = std::result::Result<T, RpcError>;

/// Errors that can occur while talking to the registry or a peer.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum RpcError {
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Operation timed out")]
    Timeout,

    #[error("Endpoint {0} is unreachable")]
    Unreachable(String),

    #[error("Rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl RpcError {
    /// True when the remote side could not be reached at all.
    ///
    /// Callers skip such endpoints instead of failing the whole operation.
    #[inline]
    #[must_use]
    pub fn is_unreachable(&self) -> bool {
        match self {
            RpcError::Timeout | RpcError::Unreachable(_) => true,
            RpcError::Transport(e) => e.is_connect() || e.is_timeout() || e.is_request(),
            _ => false,
        }
    }

    /// True when the remote service answered with a state error (404/409).
    #[inline]
    #[must_use]
    pub fn is_state_error(&self) -> bool {
        matches!(self, RpcError::Rejected { status: 404 | 409, .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_is_unreachable() {
        assert!(RpcError::Timeout.is_unreachable());
        assert!(RpcError::Unreachable("h:1".into()).is_unreachable());
    }

    #[test]
    fn test_rejected_is_state_error() {
        let err = RpcError::Rejected {
            status: 409,
            message: "not a member".into(),
        };
        assert!(err.is_state_error());
        assert!(!err.is_unreachable());
        assert_eq!(err.to_string(), "Rejected (409): not a member");

        let err = RpcError::Rejected {
            status: 500,
            message: "disk".into(),
        };
        assert!(!err.is_state_error());
    }
}
