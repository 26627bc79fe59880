//! WebSocket presence: connection state, registry, broadcast, upgrade gate,
//! and per-connection session lifecycle.

pub mod broadcast;
pub mod connection;
pub mod registry;
pub mod session;
pub mod upgrade;
