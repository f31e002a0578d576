//! # smrt Config
//!
//! Two kinds of configuration:
//!
//! - [`SmrtConfig`]: framework settings (bind address, broadcast port,
//!   logging, schema directory), loaded in layers by [`ConfigLoader`].
//! - Application configuration: an arbitrary JSON document named by
//!   `SMRT_CONFIGURATION`, optionally schema-checked, loaded by
//!   [`AppConfigLoader`].
//!
//! ## Environment Variables
//!
//! | Variable | Setting |
//! |----------|---------|
//! | `SMRT__SERVER__HTTP_ADDR` | `server.http_addr` |
//! | `SMRT__SERVER__SHUTDOWN_TIMEOUT_SECS` | `server.shutdown_timeout_secs` |
//! | `SMRT__BROADCAST__PORT` | `broadcast.port` |
//! | `SMRT__LOGGING__LEVEL` | `logging.level` |
//! | `SMRT__LOGGING__FORMAT` | `logging.format` |
//! | `SMRT__LOGGING__FILE` / `SMRT_LOG` | `logging.file` |
//! | `SMRT__SCHEMAS__PATH` | `schemas.path` |
//! | `SMRT_CONFIGURATION` | application configuration file |

#![doc(html_root_url = "https://docs.rs/smrt-config/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod app;
mod error;
mod loader;
mod settings;

pub use app::{load_path, AppConfigLoader, CONFIGURATION_ENV};
pub use error::ConfigError;
pub use loader::{ConfigLoader, ENV_PREFIX, LOG_FILE_ENV};
pub use settings::{
    BroadcastSettings, LogFormat, LoggingSettings, SchemaSettings, ServerSettings, SmrtConfig,
    DEFAULT_BROADCAST_PORT, DEFAULT_HTTP_ADDR,
};
