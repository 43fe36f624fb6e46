//! Route table shared by servers and clients.

pub mod routes {
    pub const HEALTH: &str = "/health";

    pub const FIND: &str = "/registry/find";
    pub const LOGIN: &str = "/registry/login";
    pub const LOGOUT: &str = "/registry/logout";
    pub const JOIN_ROOM: &str = "/registry/join-room";
    pub const LEAVE_ROOM: &str = "/registry/leave-room";

    pub const VERSION: &str = "/peer/version";
    pub const HISTORY: &str = "/peer/history";
    pub const APPEND: &str = "/peer/append";
}

/// JSON error body: `{"error": {"message": ...}}`
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ErrorDetail {
    pub message: String,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                message: message.into(),
            },
        }
    }
}
