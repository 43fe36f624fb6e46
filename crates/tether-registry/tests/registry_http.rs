//! Registry over real HTTP, through the same client peers use.

use std::sync::Arc;
use tether_registry::PresenceRegistry;
use tether_rpc::{ClientConfig, Endpoint, HttpRegistry, RegistryApi, RpcError};
use tokio::net::TcpListener;

async fn spawn_registry() -> (HttpRegistry, Arc<PresenceRegistry>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let registry = Arc::new(PresenceRegistry::new());

    let served = registry.clone();
    tokio::spawn(async move {
        tether_registry::serve(listener, served).await.unwrap();
    });

    let client = HttpRegistry::new(format!("http://{}", addr), &ClientConfig::default()).unwrap();
    (client, registry)
}

fn ep(port: u16) -> Endpoint {
    Endpoint::new("127.0.0.1", port)
}

#[tokio::test]
async fn test_find_unknown_token() {
    let (client, _) = spawn_registry().await;

    let reply = client.find("alice").await.unwrap();
    assert!(!reply.found);
    assert!(reply.endpoints.is_empty());
}

#[tokio::test]
async fn test_login_find_logout() {
    let (client, registry) = spawn_registry().await;

    client.login("alice", &ep(30001)).await.unwrap();
    client.login("alice", &ep(30002)).await.unwrap();

    let reply = client.find("alice").await.unwrap();
    assert!(reply.found);
    assert_eq!(reply.endpoints, vec![ep(30002)]);

    client.logout("alice").await.unwrap();
    assert!(!client.find("alice").await.unwrap().found);
    assert_eq!(registry.token_count(), 0);

    let err = client.logout("alice").await.unwrap_err();
    assert!(matches!(err, RpcError::Rejected { status: 404, .. }));
}

#[tokio::test]
async fn test_second_leave_is_reported() {
    let (client, _) = spawn_registry().await;

    client.join_room("r", &ep(1)).await.unwrap();
    client.join_room("r", &ep(2)).await.unwrap();

    client.leave_room("r", &ep(2)).await.unwrap();
    let err = client.leave_room("r", &ep(2)).await.unwrap_err();
    assert!(err.is_state_error(), "unexpected error: {err}");
    match err {
        RpcError::Rejected { status, message } => {
            assert_eq!(status, 409);
            assert!(message.contains("not a member"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_room_lifecycle() {
    let (client, _) = spawn_registry().await;

    assert!(client.join_room("lobby", &ep(1)).await.unwrap());
    assert!(!client.join_room("lobby", &ep(1)).await.unwrap());
    assert_eq!(client.find("lobby").await.unwrap().endpoints, vec![ep(1)]);

    client.leave_room("lobby", &ep(1)).await.unwrap();
    assert!(!client.find("lobby").await.unwrap().found);

    assert!(client.join_room("lobby", &ep(3)).await.unwrap());
    assert_eq!(client.find("lobby").await.unwrap().endpoints, vec![ep(3)]);
}
