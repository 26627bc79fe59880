//! Settings type definitions.

use serde::{Deserialize, Serialize};

/// Top-level settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RosterSettings {
    /// Settings schema version.
    pub version: u32,
    /// Server binding and connection tuning.
    pub server: ServerSettings,
    /// Credential verification.
    pub auth: AuthSettings,
    /// Logging configuration.
    pub logging: LoggingSettings,
}

impl Default for RosterSettings {
    fn default() -> Self {
        Self {
            version: 1,
            server: ServerSettings::default(),
            auth: AuthSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

/// Server binding and per-connection tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerSettings {
    /// Host to bind.
    pub host: String,
    /// Port to bind (0 for auto-assign).
    pub port: u16,
    /// Capacity of each connection's outbound send queue.
    pub send_queue_capacity: usize,
    /// Interval between server-initiated Ping frames, in seconds.
    pub heartbeat_interval_secs: u64,
    /// Close a connection after this long without a Pong, in seconds.
    pub heartbeat_timeout_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 3100,
            send_queue_capacity: 256,
            heartbeat_interval_secs: 30,
            heartbeat_timeout_secs: 90,
        }
    }
}

/// Credential verification settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AuthSettings {
    /// Shared HMAC secret the refresh tokens are signed with.
    ///
    /// Empty by default; the server refuses to start without one. Usually
    /// supplied via the `SECRET_REFRESH_TOKEN` environment variable so the
    /// secret never lands in the settings file.
    pub refresh_token_secret: String,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Default tracing filter directive (overridden by `RUST_LOG`).
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let s = RosterSettings::default();
        assert_eq!(s.version, 1);
        assert_eq!(s.server.host, "127.0.0.1");
        assert_eq!(s.server.port, 3100);
        assert_eq!(s.server.send_queue_capacity, 256);
        assert_eq!(s.server.heartbeat_interval_secs, 30);
        assert_eq!(s.server.heartbeat_timeout_secs, 90);
        assert!(s.auth.refresh_token_secret.is_empty());
        assert_eq!(s.logging.level, "info");
    }

    #[test]
    fn serde_uses_camel_case() {
        let json = serde_json::to_value(RosterSettings::default()).unwrap();
        assert!(json["server"].get("sendQueueCapacity").is_some());
        assert!(json["server"].get("heartbeatIntervalSecs").is_some());
        assert!(json["auth"].get("refreshTokenSecret").is_some());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let s: RosterSettings =
            serde_json::from_str(r#"{"server":{"port":9090}}"#).unwrap();
        assert_eq!(s.server.port, 9090);
        assert_eq!(s.server.host, "127.0.0.1");
        assert_eq!(s.logging.level, "info");
    }
}
