use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tether_rpc::protocol::ErrorBody;
use tether_rpc::RpcError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("unknown token '{0}'")]
    UnknownToken(String),

    #[error("endpoint {endpoint} is not a member of '{token}'")]
    NotMember { token: String, endpoint: String },
}

pub type Result<T> = core::result::Result<T, RegistryError>;

impl RegistryError {
    pub fn status(&self) -> StatusCode {
        match self {
            RegistryError::UnknownToken(_) => StatusCode::NOT_FOUND,
            RegistryError::NotMember { .. } => StatusCode::CONFLICT,
        }
    }
}

impl IntoResponse for RegistryError {
    fn into_response(self) -> Response {
        (self.status(), Json(ErrorBody::new(self.to_string()))).into_response()
    }
}

// In-process callers see the same shape an HTTP client would
impl From<RegistryError> for RpcError {
    fn from(err: RegistryError) -> Self {
        RpcError::Rejected {
            status: err.status().as_u16(),
            message: err.to_string(),
        }
    }
}
