//! Tether RPC layer
//!
//! Wire types shared by the registry and every peer, the transport traits the
//! peer core is written against, and the JSON-over-HTTP clients implementing
//! them.

pub mod client;
pub mod error;
pub mod protocol;
pub mod traits;
pub mod types;

pub use client::{ClientConfig, HttpPeerNetwork, HttpRegistry};
pub use error::{Result, RpcError};
pub use traits::{PeerNetwork, RegistryApi};
pub use types::{ConversationId, Endpoint, EndpointSet, FindReply, Snapshot};
