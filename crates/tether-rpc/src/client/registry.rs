use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::{post_json, ClientConfig};
use crate::error::Result;
use crate::protocol::routes;
use crate::traits::RegistryApi;
use crate::types::messages::{Ack, BindRequest, JoinReply, TokenRequest};
use crate::types::{Endpoint, FindReply};

/// Registry client talking to a remote `tether-registry`.
#[derive(Clone)]
pub struct HttpRegistry {
    client: Client,
    base_url: String,
}

impl HttpRegistry {
    pub fn new(base_url: impl Into<String>, config: &ClientConfig) -> Result<Self> {
        Ok(Self {
            client: config.build()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, route: &str) -> String {
        format!("{}{}", self.base_url, route)
    }

    async fn bind<R: DeserializeOwned>(
        &self,
        route: &str,
        token: &str,
        endpoint: &Endpoint,
    ) -> Result<R> {
        let body = BindRequest {
            token: token.to_string(),
            endpoint: endpoint.clone(),
        };
        post_json(&self.client, &self.url(route), &body).await
    }
}

#[async_trait]
impl RegistryApi for HttpRegistry {
    async fn find(&self, token: &str) -> Result<FindReply> {
        debug!("find {}", token);
        let body = TokenRequest {
            token: token.to_string(),
        };
        post_json(&self.client, &self.url(routes::FIND), &body).await
    }

    async fn login(&self, token: &str, endpoint: &Endpoint) -> Result<()> {
        let _: Ack = self.bind(routes::LOGIN, token, endpoint).await?;
        Ok(())
    }

    async fn logout(&self, token: &str) -> Result<()> {
        let body = TokenRequest {
            token: token.to_string(),
        };
        let _: Ack = post_json(&self.client, &self.url(routes::LOGOUT), &body).await?;
        Ok(())
    }

    async fn join_room(&self, token: &str, endpoint: &Endpoint) -> Result<bool> {
        let reply: JoinReply = self.bind(routes::JOIN_ROOM, token, endpoint).await?;
        Ok(reply.created)
    }

    async fn leave_room(&self, token: &str, endpoint: &Endpoint) -> Result<()> {
        let _: Ack = self.bind(routes::LEAVE_ROOM, token, endpoint).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_trimmed() {
        let registry = HttpRegistry::new("http://127.0.0.1:10001/", &ClientConfig::default()).unwrap();
        assert_eq!(registry.base_url(), "http://127.0.0.1:10001");
        assert_eq!(
            registry.url(routes::FIND),
            "http://127.0.0.1:10001/registry/find"
        );
    }

    #[tokio::test]
    async fn test_unreachable_registry() {
        // Port 9 (discard) is never served by the test harness.
        let registry = HttpRegistry::new("http://127.0.0.1:9", &ClientConfig::default()).unwrap();
        let err = registry.find("alice").await.unwrap_err();
        assert!(err.is_unreachable(), "unexpected error: {err}");
    }
}
