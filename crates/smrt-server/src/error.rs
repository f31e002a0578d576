//! Server error types.

use smrt_core::StateError;
use thiserror::Error;

/// Errors raised while building or running the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The bind address does not parse.
    #[error("invalid address '{addr}': {source}")]
    InvalidAddress {
        /// The configured address.
        addr: String,
        /// Parse error.
        #[source]
        source: std::net::AddrParseError,
    },

    /// Binding the listener failed.
    #[error("failed to bind to {addr}: {source}")]
    Bind {
        /// The address.
        addr: std::net::SocketAddr,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Two routes answer the same method at the same path.
    #[error("route {method} {path} is already registered")]
    DuplicateRoute {
        /// The method.
        method: String,
        /// The path template.
        path: String,
    },

    /// A route path does not start with `/`.
    #[error("route path '{0}' must start with '/'")]
    InvalidPath(String),

    /// The application could not be registered.
    #[error("application registration failed: {0}")]
    Registration(#[from] StateError),

    /// I/O error while serving.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ServerError::DuplicateRoute {
            method: "GET".to_string(),
            path: "/status".to_string(),
        };
        assert_eq!(err.to_string(), "route GET /status is already registered");

        let err = ServerError::InvalidPath("lamps".to_string());
        assert_eq!(err.to_string(), "route path 'lamps' must start with '/'");
    }
}
