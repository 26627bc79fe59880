//! `RosterServer` — Axum HTTP + WebSocket presence server.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use axum::extract::State;
use axum::response::Json;
use axum::routing::get;
use tokio::task::JoinHandle;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use roster_auth::TokenVerifier;

use crate::config::ServerConfig;
use crate::health::{self, HealthResponse};
use crate::shutdown::ShutdownCoordinator;
use crate::websocket::broadcast::PresenceBroadcaster;
use crate::websocket::registry::PresenceRegistry;
use crate::websocket::upgrade::ws_upgrade;

/// Shared state accessible from Axum handlers and session tasks.
#[derive(Clone)]
pub struct AppState {
    /// Connected-user registry.
    pub registry: Arc<PresenceRegistry>,
    /// Snapshot fan-out.
    pub broadcaster: Arc<PresenceBroadcaster>,
    /// Refresh-credential verifier.
    pub verifier: Arc<TokenVerifier>,
    /// Shutdown coordinator.
    pub shutdown: Arc<ShutdownCoordinator>,
    /// Connection tuning.
    pub config: Arc<ServerConfig>,
    /// When the server started.
    pub start_time: Instant,
}

/// The presence server.
pub struct RosterServer {
    config: Arc<ServerConfig>,
    registry: Arc<PresenceRegistry>,
    broadcaster: Arc<PresenceBroadcaster>,
    verifier: Arc<TokenVerifier>,
    shutdown: Arc<ShutdownCoordinator>,
    start_time: Instant,
}

impl RosterServer {
    /// Create a new server with its own registry and broadcaster.
    pub fn new(config: ServerConfig, verifier: TokenVerifier) -> Self {
        let registry = Arc::new(PresenceRegistry::new());
        Self {
            config: Arc::new(config),
            broadcaster: Arc::new(PresenceBroadcaster::new(registry.clone())),
            registry,
            verifier: Arc::new(verifier),
            shutdown: Arc::new(ShutdownCoordinator::new()),
            start_time: Instant::now(),
        }
    }

    /// Build the Axum router with all routes.
    pub fn router(&self) -> Router {
        let state = AppState {
            registry: self.registry.clone(),
            broadcaster: self.broadcaster.clone(),
            verifier: self.verifier.clone(),
            shutdown: self.shutdown.clone(),
            config: self.config.clone(),
            start_time: self.start_time,
        };

        Router::new()
            .route("/health", get(health_handler))
            .route("/ws", get(ws_upgrade))
            .layer(CorsLayer::permissive())
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }

    /// Bind and start serving.
    ///
    /// Returns the bound address (useful with port 0) and the join handle
    /// of the serve task. The task exits after the shutdown token is
    /// cancelled and in-flight connections have closed.
    pub async fn listen(&self) -> std::io::Result<(SocketAddr, JoinHandle<()>)> {
        let listener =
            tokio::net::TcpListener::bind((self.config.host.as_str(), self.config.port)).await?;
        let addr = listener.local_addr()?;
        let app = self.router();
        let token = self.shutdown.token();

        let handle = tokio::spawn(async move {
            let serve = axum::serve(listener, app)
                .with_graceful_shutdown(token.cancelled_owned());
            if let Err(e) = serve.await {
                error!(error = %e, "server error");
            }
        });

        info!(%addr, "presence server listening");
        Ok((addr, handle))
    }

    /// Get the connection registry.
    pub fn registry(&self) -> &Arc<PresenceRegistry> {
        &self.registry
    }

    /// Get the broadcaster.
    pub fn broadcaster(&self) -> &Arc<PresenceBroadcaster> {
        &self.broadcaster
    }

    /// Get the shutdown coordinator.
    pub fn shutdown(&self) -> &Arc<ShutdownCoordinator> {
        &self.shutdown
    }

    /// Get the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

/// GET /health
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let online = state.registry.count().await;
    Json(health::health_check(state.start_time, online))
}
