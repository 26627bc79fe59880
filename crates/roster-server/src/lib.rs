//! # roster-server
//!
//! Axum HTTP + `WebSocket` presence server.
//!
//! - `WebSocket` upgrade gate: cookie credential verification before upgrade
//! - Connection registry: one live connection per authenticated user
//! - Presence broadcast: full snapshot fan-out on every registry change
//! - HTTP endpoints: health check
//! - Graceful shutdown via `tokio::signal` + `CancellationToken`

#![deny(unsafe_code)]

pub mod config;
pub mod health;
pub mod server;
pub mod shutdown;
pub mod websocket;
