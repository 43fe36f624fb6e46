//! Presence registry
//!
//! Wraps the [`EndpointStore`] behind one exclusive lock. Every operation is a
//! single locked map mutation; nothing here touches the network.

use async_trait::async_trait;
use parking_lot::Mutex;
use tether_rpc::{Endpoint, FindReply, RegistryApi};
use tracing::info;

use crate::error::Result;
use crate::store::EndpointStore;

#[derive(Debug, Default)]
pub struct PresenceRegistry {
    store: Mutex<EndpointStore>,
}

impl PresenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn find(&self, token: &str) -> FindReply {
        let store = self.store.lock();
        match store.get(token) {
            Some(endpoints) => FindReply {
                found: true,
                endpoints: endpoints.clone(),
            },
            None => FindReply::missing(),
        }
    }

    pub fn login(&self, token: &str, endpoint: Endpoint) {
        let replaced = self.store.lock().bind(token, endpoint.clone());
        match replaced {
            Some(previous) => info!(
                "User {} login at {} (replaces {:?})",
                token, endpoint, previous
            ),
            None => info!("User {} login at {}", token, endpoint),
        }
    }

    pub fn logout(&self, token: &str) -> Result<()> {
        self.store.lock().remove(token)?;
        info!("User {} logoff", token);
        Ok(())
    }

    /// Returns whether this join created the room
    pub fn join_room(&self, token: &str, endpoint: Endpoint) -> bool {
        let outcome = self.store.lock().join(token, endpoint.clone());
        if outcome.created {
            info!("Room {} created by {}", token, endpoint);
        } else if outcome.added {
            info!("Room {} joined by {}", token, endpoint);
        } else {
            info!("Room {} already has member {}", token, endpoint);
        }
        outcome.created
    }

    pub fn leave_room(&self, token: &str, endpoint: &Endpoint) -> Result<()> {
        let outcome = self.store.lock().leave(token, endpoint)?;
        if outcome.dismissed {
            info!("Room {} dismissed", token);
        } else {
            info!(
                "Room {} left by {} ({} remaining)",
                token, endpoint, outcome.remaining
            );
        }
        Ok(())
    }

    pub fn token_count(&self) -> usize {
        self.store.lock().len()
    }
}

#[async_trait]
impl RegistryApi for PresenceRegistry {
    async fn find(&self, token: &str) -> tether_rpc::Result<FindReply> {
        Ok(PresenceRegistry::find(self, token))
    }

    async fn login(&self, token: &str, endpoint: &Endpoint) -> tether_rpc::Result<()> {
        PresenceRegistry::login(self, token, endpoint.clone());
        Ok(())
    }

    async fn logout(&self, token: &str) -> tether_rpc::Result<()> {
        Ok(PresenceRegistry::logout(self, token)?)
    }

    async fn join_room(&self, token: &str, endpoint: &Endpoint) -> tether_rpc::Result<bool> {
        Ok(PresenceRegistry::join_room(self, token, endpoint.clone()))
    }

    async fn leave_room(&self, token: &str, endpoint: &Endpoint) -> tether_rpc::Result<()> {
        Ok(PresenceRegistry::leave_room(self, token, endpoint)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RegistryError;
    use std::sync::Arc;

    fn ep(port: u16) -> Endpoint {
        Endpoint::new("127.0.0.1", port)
    }

    #[test]
    fn test_find_absent_token() {
        let registry = PresenceRegistry::new();
        let reply = registry.find("alice");
        assert!(!reply.found);
        assert!(reply.endpoints.is_empty());
    }

    #[test]
    fn test_login_logout_sequence() {
        let registry = PresenceRegistry::new();
        registry.login("alice", ep(1));
        registry.login("bob", ep(2));
        registry.login("alice", ep(3));

        assert_eq!(registry.find("alice").endpoints, vec![ep(3)]);

        registry.logout("alice").unwrap();
        assert!(!registry.find("alice").found);
        assert!(registry.find("bob").found);

        assert_eq!(
            registry.logout("alice"),
            Err(RegistryError::UnknownToken("alice".into()))
        );
    }

    #[test]
    fn test_leave_twice_is_a_state_error() {
        let registry = PresenceRegistry::new();
        assert!(registry.join_room("r", ep(1)));
        assert!(!registry.join_room("r", ep(2)));

        registry.leave_room("r", &ep(2)).unwrap();
        assert!(matches!(
            registry.leave_room("r", &ep(2)),
            Err(RegistryError::NotMember { .. })
        ));
        assert_eq!(registry.find("r").endpoints, vec![ep(1)]);
    }

    #[tokio::test]
    async fn test_trait_maps_state_errors() {
        let registry: Arc<dyn RegistryApi> = Arc::new(PresenceRegistry::new());
        let err = registry.leave_room("r", &ep(1)).await.unwrap_err();
        assert!(err.is_state_error());
        assert!(!err.is_unreachable());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_joins_are_not_lost() {
        let registry = Arc::new(PresenceRegistry::new());

        let handles: Vec<_> = (0..64u16)
            .map(|port| {
                let registry = registry.clone();
                tokio::spawn(async move { registry.join_room("busy", ep(port)) })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(registry.find("busy").endpoints.len(), 64);

        let handles: Vec<_> = (0..64u16)
            .map(|port| {
                let registry = registry.clone();
                tokio::spawn(async move { registry.leave_room("busy", &ep(port)) })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        assert!(!registry.find("busy").found);
        assert_eq!(registry.token_count(), 0);
    }
}
