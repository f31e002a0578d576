//! Framework settings.
//!
//! Every section has defaults, so an empty file (or no file) yields a
//! working configuration. Unknown fields are rejected.

use crate::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default HTTP bind address.
pub const DEFAULT_HTTP_ADDR: &str = "0.0.0.0:8080";

/// Default UDP port for service broadcasts.
pub const DEFAULT_BROADCAST_PORT: u16 = 28015;

/// Root framework configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SmrtConfig {
    /// HTTP server settings.
    pub server: ServerSettings,
    /// Broadcast settings.
    pub broadcast: BroadcastSettings,
    /// Logging settings.
    pub logging: LoggingSettings,
    /// Schema lookup settings.
    pub schemas: SchemaSettings,
}

impl SmrtConfig {
    /// Checks values that parse but cannot be used.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self
            .server
            .http_addr
            .parse::<std::net::SocketAddr>()
            .is_err()
        {
            return Err(ConfigError::invalid_value(
                "server.http_addr",
                format!("invalid socket address: {}", self.server.http_addr),
            ));
        }

        if self.broadcast.port == 0 {
            return Err(ConfigError::invalid_value("broadcast.port", "must not be 0"));
        }

        if self.logging.level.trim().is_empty() {
            return Err(ConfigError::invalid_value("logging.level", "must not be empty"));
        }

        Ok(())
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerSettings {
    /// Address to bind, e.g. `0.0.0.0:8080`.
    pub http_addr: String,
    /// Seconds to wait for in-flight requests on shutdown.
    pub shutdown_timeout_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            http_addr: DEFAULT_HTTP_ADDR.to_string(),
            shutdown_timeout_secs: 30,
        }
    }
}

/// Broadcast settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BroadcastSettings {
    /// UDP port used for both sending and listening.
    pub port: u16,
}

impl Default for BroadcastSettings {
    fn default() -> Self {
        Self {
            port: DEFAULT_BROADCAST_PORT,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable output.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingSettings {
    /// Filter directive, e.g. `info` or `smrt_server=debug,info`.
    pub level: String,
    /// Output format.
    pub format: LogFormat,
    /// Additional plain-text log file.
    pub file: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            file: None,
        }
    }
}

/// Schema lookup settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SchemaSettings {
    /// Directory searched before the bundled and working-directory schemas.
    pub path: Option<PathBuf>,
}
