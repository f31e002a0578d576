//! Observability for smrt services.
//!
//! - **Logging**: `tracing` subscriber with pretty or JSON stdout output and
//!   an optional append-only log file (`SMRT_LOG`).
//! - **Metrics**: descriptions for the counters and histograms the pipeline
//!   records through the `metrics` facade.
//!
//! # Severity
//!
//! | Event | Level |
//! |-------|-------|
//! | Internal fault (500) | `error`, with the source chain |
//! | Downstream fault (502, 504) | `warn` |
//! | Client fault (4xx) | `debug` |
//! | Handler timing | `debug` |
//! | Startup, registration, configuration | `info` |

#![warn(missing_docs)]

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::TelemetryError;
pub use logging::{create_env_filter, init_logging, LogConfig};
pub use metrics::{describe_metrics, BROADCASTS_TOTAL};

use smrt_config::LoggingSettings;

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// Installs logging from framework settings and describes metrics.
///
/// # Errors
///
/// Returns `TelemetryError` if logging cannot be initialized.
pub fn init_telemetry(settings: &LoggingSettings) -> TelemetryResult<()> {
    init_logging(&LogConfig::from(settings))?;
    describe_metrics();
    Ok(())
}
