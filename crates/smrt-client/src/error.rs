//! Client error types.

use smrt_core::Fault;
use thiserror::Error;

/// Errors raised by outbound requests.
///
/// Each variant maps onto the fault taxonomy through `From<ClientError> for
/// Fault`:
///
/// | Variant | Fault | Status |
/// |---|---|---|
/// | `Unreachable` | `GatewayTimeout` | 504 |
/// | `DownstreamError`, `Decode` | `BadGateway` | 502 |
/// | everything else | `Internal` | 500 |
#[derive(Debug, Error)]
pub enum ClientError {
    /// Only GET, PUT, POST and DELETE are supported.
    #[error("unsupported rest method: {0}")]
    UnsupportedMethod(http::Method),

    /// The URL does not parse.
    #[error("invalid uri for rest request: {url} ({reason})")]
    InvalidUrl {
        /// The URL as given.
        url: String,
        /// Parse failure.
        reason: String,
    },

    /// The request body could not be serialised.
    #[error("failed to serialise request body: {0}")]
    Serialize(#[source] serde_json::Error),

    /// The underlying HTTP client could not be built.
    #[error("failed to create client: {0}")]
    Build(#[source] reqwest::Error),

    /// No response arrived: connection refused, DNS failure or timeout.
    #[error("received no response from \"{url}\": {source}")]
    Unreachable {
        /// Target URL.
        url: String,
        /// Underlying error.
        #[source]
        source: reqwest::Error,
    },

    /// The downstream service answered with an internal server error.
    #[error("downstream \"{url}\" answered 500: {body}")]
    DownstreamError {
        /// Target URL.
        url: String,
        /// Response body text.
        body: String,
    },

    /// The downstream response body could not be read or decoded.
    #[error("invalid response from \"{url}\": {reason}")]
    Decode {
        /// Target URL.
        url: String,
        /// What went wrong.
        reason: String,
    },
}

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

impl From<ClientError> for Fault {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Unreachable { .. } => Fault::gateway_timeout(err.to_string()),
            ClientError::DownstreamError { .. } | ClientError::Decode { .. } => {
                Fault::bad_gateway(err.to_string())
            }
            ClientError::UnsupportedMethod(_)
            | ClientError::InvalidUrl { .. }
            | ClientError::Serialize(_)
            | ClientError::Build(_) => Fault::internal_with_source("outbound request failed", err),
        }
    }
}
