//! Presence session lifecycle — one connected client from upgrade through
//! disconnect.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

use roster_core::Identity;

use crate::server::AppState;

use super::connection::PresenceConnection;

/// Run a presence session for an authenticated, upgraded connection.
///
/// 1. Registers the connection (closing any prior handle for this user)
/// 2. Broadcasts the post-registration snapshot to everyone
/// 3. Forwards outbound snapshots and periodic Ping frames
/// 4. Treats close and transport error identically: unregister + rebroadcast
#[instrument(skip_all, fields(user_id = identity.id))]
pub async fn run_presence_session(ws: WebSocket, identity: Identity, state: AppState) {
    let (mut ws_tx, mut ws_rx) = ws.split();

    let (send_tx, mut send_rx) = mpsc::channel::<Arc<String>>(state.config.send_queue_capacity);
    let connection = Arc::new(PresenceConnection::new(identity, send_tx));
    let user_id = connection.user_id();
    let conn_id = connection.conn_id;
    info!(%conn_id, "presence client connected");

    // Single live entry per user: a reconnect replaces the old handle, and
    // the old handle is told to close rather than silently leaked.
    if let Some(replaced) = state.registry.register(connection.clone()).await {
        info!(replaced_conn = %replaced.conn_id, "closing replaced connection for reconnect");
        replaced.close();
    }
    state.broadcaster.broadcast_snapshot().await;

    let ping_interval = Duration::from_secs(state.config.heartbeat_interval_secs);
    let pong_timeout = Duration::from_secs(state.config.heartbeat_timeout_secs);

    // Outbound forwarder with periodic Ping frames.
    let outbound_conn = connection.clone();
    let outbound_close = connection.close_token();
    let outbound = tokio::spawn(async move {
        let mut ping = tokio::time::interval(ping_interval);
        // Skip the immediate first tick
        let _ = ping.tick().await;

        loop {
            tokio::select! {
                msg = send_rx.recv() => {
                    match msg {
                        Some(text) => {
                            if ws_tx.send(Message::Text(text.as_str().into())).await.is_err() {
                                break;
                            }
                        }
                        None => break,
                    }
                }
                _ = ping.tick() => {
                    if !outbound_conn.check_alive()
                        && outbound_conn.last_pong_elapsed() > pong_timeout
                    {
                        warn!("client unresponsive for {:?}, disconnecting", pong_timeout);
                        break;
                    }
                    if ws_tx.send(Message::Ping(vec![].into())).await.is_err() {
                        break;
                    }
                }
                () = outbound_close.cancelled() => {
                    let _ = ws_tx.send(Message::Close(None)).await;
                    break;
                }
            }
        }
    });

    // Inbound loop. Presence is server-push only: inbound frames keep the
    // connection alive but carry no meaning.
    let close_token = connection.close_token();
    let shutdown_token = state.shutdown.token();
    loop {
        tokio::select! {
            next = ws_rx.next() => {
                // A transport error is handled like a close.
                let Some(Ok(msg)) = next else { break };
                match msg {
                    Message::Close(_) => {
                        info!("client sent close frame");
                        break;
                    }
                    Message::Ping(_) | Message::Pong(_) => connection.mark_alive(),
                    Message::Text(_) | Message::Binary(_) => {
                        connection.mark_alive();
                        debug!("ignoring inbound frame on presence socket");
                    }
                }
            }
            () = close_token.cancelled() => {
                info!("connection superseded by a newer one");
                break;
            }
            () = shutdown_token.cancelled() => {
                info!("server shutting down, closing presence session");
                break;
            }
        }
    }

    info!(%conn_id, "presence client disconnected");
    outbound.abort();

    // Only the handle actually in the registry unregisters; a replaced
    // connection's cleanup must not evict its replacement or rebroadcast.
    if state.registry.unregister(user_id, conn_id).await {
        state.broadcaster.broadcast_snapshot().await;
    }
}
