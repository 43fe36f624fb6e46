use crate::error::Result;
use crate::types::{ConversationId, Endpoint, FindReply, Snapshot};
use async_trait::async_trait;

/// Abstraction for the presence registry.
///
/// Implemented by the HTTP client and, in-process, by the registry itself.
#[async_trait]
pub trait RegistryApi: Send + Sync + 'static {
    async fn find(&self, token: &str) -> Result<FindReply>;
    async fn login(&self, token: &str, endpoint: &Endpoint) -> Result<()>;
    async fn logout(&self, token: &str) -> Result<()>;
    /// Returns whether the join created the room.
    async fn join_room(&self, token: &str, endpoint: &Endpoint) -> Result<bool>;
    async fn leave_room(&self, token: &str, endpoint: &Endpoint) -> Result<()>;
}

/// Abstraction for calls into other peers' services.
#[async_trait]
pub trait PeerNetwork: Send + Sync + 'static {
    async fn get_version(&self, endpoint: &Endpoint, conversation: &ConversationId)
        -> Result<u64>;

    async fn get_history(
        &self,
        endpoint: &Endpoint,
        conversation: &ConversationId,
    ) -> Result<Snapshot>;

    async fn append(
        &self,
        endpoint: &Endpoint,
        conversation: &ConversationId,
        message: &str,
    ) -> Result<()>;
}
