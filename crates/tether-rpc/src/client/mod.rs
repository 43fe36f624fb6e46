//! JSON-over-HTTP clients for the registry and peer services.

pub mod config;
pub mod peer;
pub mod registry;

pub use config::ClientConfig;
pub use peer::HttpPeerNetwork;
pub use registry::HttpRegistry;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Result, RpcError};
use crate::protocol::ErrorBody;

/// POST a JSON body and decode the JSON reply.
///
/// Non-success statuses become [`RpcError::Rejected`] carrying the server's
/// error message.
pub(crate) async fn post_json<B, R>(client: &Client, url: &str, body: &B) -> Result<R>
where
    B: Serialize + ?Sized,
    R: DeserializeOwned,
{
    let resp = client
        .post(url)
        .json(body)
        .send()
        .await
        .map_err(classify)?;

    let status = resp.status();
    if !status.is_success() {
        let message = match resp.json::<ErrorBody>().await {
            Ok(body) => body.error.message,
            Err(_) => status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string(),
        };
        return Err(RpcError::Rejected {
            status: status.as_u16(),
            message,
        });
    }

    resp.json::<R>().await.map_err(classify)
}

fn classify(err: reqwest::Error) -> RpcError {
    if err.is_timeout() {
        RpcError::Timeout
    } else {
        RpcError::Transport(err)
    }
}
