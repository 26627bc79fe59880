//! # roster-core
//!
//! Shared presence types: the authenticated [`Identity`] carried by every
//! connection and the [`ServerMessage`] envelope sent over the wire.

#![deny(unsafe_code)]

pub mod identity;
pub mod messages;

pub use identity::{Identity, UserId};
pub use messages::ServerMessage;
