//! WebSocket client connection state.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use roster_core::{Identity, UserId};

/// One live presence connection for an authenticated user.
///
/// The identity is immutable for the lifetime of the connection; it was
/// decoded from the verified credential at upgrade time. The connection id
/// distinguishes this handle from any earlier or later connection by the
/// same user, so a stale close event can never evict a replacement.
pub struct PresenceConnection {
    /// Unique id of this connection (not the user).
    pub conn_id: Uuid,
    /// The authenticated user this connection belongs to.
    pub identity: Identity,
    /// Send channel to the connection's WebSocket write task.
    tx: mpsc::Sender<Arc<String>>,
    /// When this connection was established.
    pub connected_at: Instant,
    /// Whether the client has responded since the last ping.
    pub is_alive: AtomicBool,
    /// When the last Pong (or any activity) was received.
    last_pong: Mutex<Instant>,
    /// Count of messages dropped due to a full send queue.
    pub dropped_messages: AtomicU64,
    /// Cancelled to force-close this connection (e.g. on replacement).
    cancel: CancellationToken,
}

impl PresenceConnection {
    /// Create a new connection handle.
    pub fn new(identity: Identity, tx: mpsc::Sender<Arc<String>>) -> Self {
        let now = Instant::now();
        Self {
            conn_id: Uuid::now_v7(),
            identity,
            tx,
            connected_at: now,
            is_alive: AtomicBool::new(true),
            last_pong: Mutex::new(now),
            dropped_messages: AtomicU64::new(0),
            cancel: CancellationToken::new(),
        }
    }

    /// Id of the user this connection belongs to.
    pub fn user_id(&self) -> UserId {
        self.identity.id
    }

    /// Enqueue a text message for this connection.
    ///
    /// Returns `false` if the queue is full or closed, and increments the
    /// dropped message counter.
    pub fn send(&self, message: Arc<String>) -> bool {
        if self.tx.try_send(message).is_ok() {
            true
        } else {
            let _ = self.dropped_messages.fetch_add(1, Ordering::Relaxed);
            false
        }
    }

    /// Total messages dropped for this connection.
    pub fn drop_count(&self) -> u64 {
        self.dropped_messages.load(Ordering::Relaxed)
    }

    /// Mark the connection as alive (pong or any client activity).
    pub fn mark_alive(&self) {
        self.is_alive.store(true, Ordering::Relaxed);
        *self.last_pong.lock() = Instant::now();
    }

    /// Duration since the last pong (or connection establishment).
    pub fn last_pong_elapsed(&self) -> Duration {
        self.last_pong.lock().elapsed()
    }

    /// Check and reset the alive flag for the heartbeat.
    ///
    /// Returns `true` if the connection was alive since the last check.
    pub fn check_alive(&self) -> bool {
        self.is_alive.swap(false, Ordering::Relaxed)
    }

    /// Request this connection be closed.
    ///
    /// Used when a reconnecting user replaces this handle in the registry;
    /// the session tasks observe the token and shut the socket down.
    pub fn close(&self) {
        self.cancel.cancel();
    }

    /// Whether [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Token the session tasks watch for forced closure.
    pub fn close_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Connection age.
    pub fn age(&self) -> Duration {
        self.connected_at.elapsed()
    }
}
