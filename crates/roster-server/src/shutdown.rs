//! Graceful shutdown coordination via `CancellationToken`.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::websocket::registry::PresenceRegistry;

/// Default time to wait for connections to drain before giving up.
const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// Coordinates graceful shutdown across the listener and all sessions.
///
/// Every session task holds a clone of the token; cancelling it makes each
/// session close its socket, unregister, and exit, and makes the axum
/// listener stop accepting.
pub struct ShutdownCoordinator {
    token: CancellationToken,
}

impl ShutdownCoordinator {
    /// Create a new shutdown coordinator.
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
        }
    }

    /// Get a clone of the cancellation token.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Initiate shutdown.
    pub fn shutdown(&self) {
        self.token.cancel();
    }

    /// Whether a shutdown has been initiated.
    pub fn is_shutting_down(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Initiate shutdown and wait for the registry to empty.
    ///
    /// Returns `true` if every connection unregistered within `timeout`.
    pub async fn drain(&self, registry: &PresenceRegistry, timeout: Option<Duration>) -> bool {
        let timeout = timeout.unwrap_or(DEFAULT_DRAIN_TIMEOUT);
        self.shutdown();
        info!(timeout_secs = timeout.as_secs(), "draining presence connections");

        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let remaining = registry.count().await;
            if remaining == 0 {
                return true;
            }
            if tokio::time::Instant::now() >= deadline {
                warn!(remaining, "drain timed out with connections still registered");
                return false;
            }
            tokio::time::sleep(Duration::from_millis(25)).await;
        }
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}
