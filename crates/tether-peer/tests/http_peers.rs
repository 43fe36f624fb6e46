//! Two peers and a registry talking real HTTP on loopback.

use std::sync::Arc;
use tempfile::TempDir;
use tether_peer::{PeerConfig, PeerState, Session};
use tether_registry::PresenceRegistry;
use tether_rpc::{ClientConfig, ConversationId, HttpPeerNetwork, PeerNetwork, RpcError};
use tokio::net::TcpListener;

async fn spawn_registry() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        tether_registry::serve(listener, Arc::new(PresenceRegistry::new()))
            .await
            .unwrap();
    });
    format!("http://{}", addr)
}

async fn spawn_peer(root: &TempDir, registry_url: &str, name: &str) -> (Session, PeerState) {
    let mut config = PeerConfig::with_base_dir(root.path());
    config.registry_url = registry_url.to_string();

    let (session, state) = tether_peer::start(&config, name).await.unwrap();
    session.login().await.unwrap();
    (session, state)
}

#[tokio::test]
async fn test_room_chat_over_http() {
    let root = TempDir::new().unwrap();
    let registry_url = spawn_registry().await;
    let room = ConversationId::room("lobby");

    let (mut alice, alice_state) = spawn_peer(&root, &registry_url, "alice").await;
    let (mut bob, bob_state) = spawn_peer(&root, &registry_url, "bob").await;
    let mut bob_inbound = bob_state.subscribe();

    let entry = alice.enter_room("lobby").await.unwrap();
    assert!(entry.created);
    alice.send("first").await.unwrap();
    alice.send("second").await.unwrap();

    let entry = bob.enter_room("lobby").await.unwrap();
    assert!(!entry.created);
    assert_eq!(entry.reconciliation.version, 2);
    assert_eq!(
        entry.reconciliation.history,
        alice_state.ledger.history(&room).await.unwrap()
    );

    let delivery = alice.send("third").await.unwrap();
    assert_eq!(delivery.version, 3);
    assert_eq!(delivery.delivered, vec![bob.endpoint().clone()]);

    let inbound = bob_inbound.recv().await.unwrap();
    assert_eq!(inbound.conversation, room);
    assert_eq!(inbound.message, "alice: third");
    assert_eq!(inbound.version, 3);
    assert_eq!(bob_state.ledger.version(&room).await.unwrap(), 3);

    bob.logout().await.unwrap();
    let delivery = alice.send("alone").await.unwrap();
    assert!(delivery.delivered.is_empty());
    assert!(delivery.failed.is_empty());
}

#[tokio::test]
async fn test_foreign_personal_conversation_rejected() {
    let root = TempDir::new().unwrap();
    let registry_url = spawn_registry().await;
    let (carol, _state) = spawn_peer(&root, &registry_url, "carol").await;

    let network = HttpPeerNetwork::new(&ClientConfig::default()).unwrap();
    let foreign = ConversationId::personal("alice", "bob");

    let err = network
        .append(carol.endpoint(), &foreign, "alice: hi")
        .await
        .unwrap_err();
    assert!(matches!(err, RpcError::Rejected { status: 400, .. }));

    let version = network
        .get_version(carol.endpoint(), &ConversationId::room("nowhere"))
        .await
        .unwrap();
    assert_eq!(version, 0);
}
