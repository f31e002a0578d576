//! The capability set a hosting application provides.
//!
//! [`ServiceState`](crate::ServiceState) never depends on a concrete
//! application type. Anything implementing [`Application`] can be registered,
//! and its [`ApplicationStatus`] is embedded verbatim in the `/status`
//! payload.

use serde::{Deserialize, Serialize};

/// Status payload reported by a hosting application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationStatus {
    /// Application name.
    pub name: String,
    /// Free-form health word, e.g. `"OK"`.
    pub status: String,
    /// Application version.
    pub version: String,
}

impl ApplicationStatus {
    /// Creates a status payload.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        status: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            status: status.into(),
            version: version.into(),
        }
    }

    /// Returns the first required field that is empty, if any.
    #[must_use]
    pub fn missing_field(&self) -> Option<&'static str> {
        [
            ("name", &self.name),
            ("status", &self.status),
            ("version", &self.version),
        ]
        .into_iter()
        .find(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field)
    }
}

/// A hosting application that can be mounted on the framework.
///
/// # Example
///
/// ```
/// use smrt_core::{Application, ApplicationStatus};
///
/// struct Lamp;
///
/// impl Application for Lamp {
///     fn application_name(&self) -> &str {
///         "lamp"
///     }
///
///     fn version(&self) -> &str {
///         "1.2.0"
///     }
///
///     fn status(&self) -> ApplicationStatus {
///         ApplicationStatus::new(self.application_name(), "OK", self.version())
///     }
/// }
/// ```
pub trait Application: Send + Sync + 'static {
    /// Returns the application name.
    fn application_name(&self) -> &str;

    /// Returns the application version.
    fn version(&self) -> &str;

    /// Returns the current status payload.
    fn status(&self) -> ApplicationStatus;
}
