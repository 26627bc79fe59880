//! # roster-settings
//!
//! Settings for the presence server: compiled defaults, deep-merged with
//! `~/.roster/settings.json` when present, then environment overrides.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::SettingsError;
pub use types::RosterSettings;
