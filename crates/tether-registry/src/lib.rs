//! Tether Presence Registry
//!
//! Tracks which endpoint each user token and which endpoint set each room
//! token currently owns. Peers consult it before every fan-out.

pub mod config;
pub mod error;
pub mod handlers;
pub mod registry;
pub mod store;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tether_rpc::protocol::routes;
use tokio::net::TcpListener;
use tracing::info;

pub use config::{AppState, RegistryConfig};
pub use error::RegistryError;
pub use registry::PresenceRegistry;
pub use store::EndpointStore;

/// Build the RPC router around an explicitly passed registry
pub fn router(registry: Arc<PresenceRegistry>) -> Router {
    let state = AppState { registry };

    Router::new()
        .route(routes::FIND, post(handlers::find))
        .route(routes::LOGIN, post(handlers::login))
        .route(routes::LOGOUT, post(handlers::logout))
        .route(routes::JOIN_ROOM, post(handlers::join_room))
        .route(routes::LEAVE_ROOM, post(handlers::leave_room))
        .route(routes::HEALTH, get(handlers::health_check))
        .with_state(state)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Serve the registry on an already bound listener until the task is dropped
pub async fn serve(listener: TcpListener, registry: Arc<PresenceRegistry>) -> anyhow::Result<()> {
    axum::serve(listener, router(registry)).await?;
    Ok(())
}

pub async fn run(config: RegistryConfig) -> anyhow::Result<()> {
    info!("=== Tether Registry ===");

    let registry = Arc::new(PresenceRegistry::new());
    let listener = TcpListener::bind(config.bind_addr).await?;

    info!("Server started, listening on {}", listener.local_addr()?);
    info!("Press CTRL+C to stop.");

    tokio::select! {
        res = serve(listener, registry.clone()) => res?,
        _ = tokio::signal::ctrl_c() => {
            info!("Shutting down with {} live tokens", registry.token_count());
        }
    }

    Ok(())
}
