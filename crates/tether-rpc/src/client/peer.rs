use async_trait::async_trait;
use reqwest::Client;

use super::{post_json, ClientConfig};
use crate::error::Result;
use crate::protocol::routes;
use crate::traits::PeerNetwork;
use crate::types::messages::{Ack, AppendRequest, ConversationRequest, VersionReply};
use crate::types::{ConversationId, Endpoint, Snapshot};

/// Calls other peers' services over HTTP, one request per call.
#[derive(Clone)]
pub struct HttpPeerNetwork {
    client: Client,
}

impl HttpPeerNetwork {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        Ok(Self {
            client: config.build()?,
        })
    }

    fn url(endpoint: &Endpoint, route: &str) -> String {
        format!("{}{}", endpoint.base_url(), route)
    }
}

#[async_trait]
impl PeerNetwork for HttpPeerNetwork {
    async fn get_version(
        &self,
        endpoint: &Endpoint,
        conversation: &ConversationId,
    ) -> Result<u64> {
        let body = ConversationRequest {
            conversation: conversation.clone(),
        };
        let reply: VersionReply =
            post_json(&self.client, &Self::url(endpoint, routes::VERSION), &body).await?;
        Ok(reply.version)
    }

    async fn get_history(
        &self,
        endpoint: &Endpoint,
        conversation: &ConversationId,
    ) -> Result<Snapshot> {
        let body = ConversationRequest {
            conversation: conversation.clone(),
        };
        post_json(&self.client, &Self::url(endpoint, routes::HISTORY), &body).await
    }

    async fn append(
        &self,
        endpoint: &Endpoint,
        conversation: &ConversationId,
        message: &str,
    ) -> Result<()> {
        let body = AppendRequest {
            conversation: conversation.clone(),
            message: message.to_string(),
        };
        let _: Ack = post_json(&self.client, &Self::url(endpoint, routes::APPEND), &body).await?;
        Ok(())
    }
}
