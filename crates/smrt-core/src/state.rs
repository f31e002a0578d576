//! Process-lifetime service state.
//!
//! [`ServiceState`] holds the outcome counters, the start time and the
//! registered [`Application`]. It is constructed once by the process entry
//! point and shared as an `Arc<ServiceState>` with the server and pipeline;
//! there is no global instance.
//!
//! Counters are atomics, so concurrent requests never lose an increment.

use crate::application::{Application, ApplicationStatus};
use crate::fault::{Bucket, Fault};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

/// Errors raised by registration and status queries.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StateError {
    /// The application does not provide a usable capability set.
    #[error("application rejected: {reason}")]
    InvalidApplication {
        /// What was wrong.
        reason: String,
    },

    /// The registered application returned a status payload without a
    /// required field.
    #[error("application status is missing required field '{field}'")]
    MalformedStatus {
        /// Name of the empty field.
        field: &'static str,
    },
}

impl From<StateError> for Fault {
    fn from(err: StateError) -> Self {
        Fault::internal_with_source("status query failed", err)
    }
}

/// Counter values at one point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counters {
    /// Requests that completed normally.
    pub amount_successful: u64,
    /// Requests flagged as warnings.
    pub amount_warning: u64,
    /// Requests that ended in an internal or upstream fault.
    pub amount_error: u64,
    /// Requests that ended in a client fault.
    pub amount_bad: u64,
    /// Sum of the four counters above.
    pub amount_total: u64,
}

/// Framework section of the status payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameworkStatus {
    /// Framework version.
    pub version: String,
    /// Whether an application is registered.
    pub app_loaded: bool,
    /// Seconds since the state was created.
    pub uptime: u64,
}

/// Immutable view returned by [`ServiceState::snapshot`].
///
/// Serializes to the `/status` response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    /// Framework information.
    pub framework: FrameworkStatus,
    /// Unix time in seconds when the snapshot was taken.
    pub server_time: i64,
    /// Outcome counters.
    pub status: Counters,
    /// Status of the registered application, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application: Option<ApplicationStatus>,
}

/// Outcome counters plus the registered application.
///
/// # Example
///
/// ```
/// use smrt_core::{Bucket, ServiceState};
///
/// let state = ServiceState::new();
/// state.record_outcome(Bucket::Successful);
/// state.record_outcome(Bucket::Bad);
///
/// let snapshot = state.snapshot().unwrap();
/// assert_eq!(snapshot.status.amount_total, 2);
/// assert!(!snapshot.framework.app_loaded);
/// ```
pub struct ServiceState {
    started_at: Instant,
    successful: AtomicU64,
    warning: AtomicU64,
    error: AtomicU64,
    bad: AtomicU64,
    application: RwLock<Option<Arc<dyn Application>>>,
}

impl ServiceState {
    /// Creates a state with zeroed counters, started now.
    #[must_use]
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            successful: AtomicU64::new(0),
            warning: AtomicU64::new(0),
            error: AtomicU64::new(0),
            bad: AtomicU64::new(0),
            application: RwLock::new(None),
        }
    }

    /// Registers the hosting application, replacing any previous one.
    ///
    /// The name and version must be non-empty and the application's current
    /// status must carry every required field. Violations are reported here,
    /// at startup, rather than on the first status query.
    pub fn register<A: Application>(&self, application: A) -> Result<(), StateError> {
        self.register_shared(Arc::new(application))
    }

    /// Registers an application that is already shared.
    pub fn register_shared(&self, application: Arc<dyn Application>) -> Result<(), StateError> {
        if application.application_name().trim().is_empty() {
            return Err(StateError::InvalidApplication {
                reason: "application name is empty".to_string(),
            });
        }
        if application.version().trim().is_empty() {
            return Err(StateError::InvalidApplication {
                reason: "application version is empty".to_string(),
            });
        }
        if let Some(field) = application.status().missing_field() {
            return Err(StateError::MalformedStatus { field });
        }

        let mut slot = self.application.write();
        if let Some(previous) = slot.as_ref() {
            tracing::warn!(
                previous = previous.application_name(),
                replacement = application.application_name(),
                "replacing registered application"
            );
        }
        tracing::info!(
            application = application.application_name(),
            version = application.version(),
            "application registered"
        );
        *slot = Some(application);
        Ok(())
    }

    /// Returns the registered application, if any.
    #[must_use]
    pub fn application(&self) -> Option<Arc<dyn Application>> {
        self.application.read().clone()
    }

    /// Increments the counter for `bucket`.
    pub fn record_outcome(&self, bucket: Bucket) {
        self.counter(bucket).fetch_add(1, Ordering::Relaxed);
    }

    /// Returns the current value of one counter.
    #[must_use]
    pub fn count(&self, bucket: Bucket) -> u64 {
        self.counter(bucket).load(Ordering::Relaxed)
    }

    /// Returns the time elapsed since construction.
    #[must_use]
    pub fn uptime(&self) -> std::time::Duration {
        self.started_at.elapsed()
    }

    /// Takes a snapshot of counters, uptime and application status.
    ///
    /// Fails if the registered application reports a status with an empty
    /// required field.
    pub fn snapshot(&self) -> Result<StatusSnapshot, StateError> {
        let application = match self.application() {
            Some(app) => {
                let status = app.status();
                if let Some(field) = status.missing_field() {
                    return Err(StateError::MalformedStatus { field });
                }
                Some(status)
            }
            None => None,
        };

        let amount_successful = self.count(Bucket::Successful);
        let amount_warning = self.count(Bucket::Warning);
        let amount_error = self.count(Bucket::Error);
        let amount_bad = self.count(Bucket::Bad);

        Ok(StatusSnapshot {
            framework: FrameworkStatus {
                version: env!("CARGO_PKG_VERSION").to_string(),
                app_loaded: application.is_some(),
                uptime: self.uptime().as_secs(),
            },
            server_time: chrono::Utc::now().timestamp(),
            status: Counters {
                amount_successful,
                amount_warning,
                amount_error,
                amount_bad,
                amount_total: amount_successful + amount_warning + amount_error + amount_bad,
            },
            application,
        })
    }

    fn counter(&self, bucket: Bucket) -> &AtomicU64 {
        match bucket {
            Bucket::Successful => &self.successful,
            Bucket::Warning => &self.warning,
            Bucket::Error => &self.error,
            Bucket::Bad => &self.bad,
        }
    }
}

impl Default for ServiceState {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ServiceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceState")
            .field("successful", &self.count(Bucket::Successful))
            .field("warning", &self.count(Bucket::Warning))
            .field("error", &self.count(Bucket::Error))
            .field("bad", &self.count(Bucket::Bad))
            .field(
                "application",
                &self.application().map(|a| a.application_name().to_string()),
            )
            .finish_non_exhaustive()
    }
}
