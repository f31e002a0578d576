//! Fault taxonomy for smrt.
//!
//! Every failed request is described by a [`Fault`]. Handlers and pipeline
//! stages return faults explicitly (`Result<T, Fault>`); the outcome stage
//! converts each fault exactly once into a status code, a counter
//! [`Bucket`] and an [`ErrorEnvelope`].
//!
//! | Kind | Code | Label | Bucket |
//! |---|---|---|---|
//! | `Internal` | 500 | Internal Server Error | error |
//! | `BadGateway` | 502 | Bad Gateway | error |
//! | `GatewayTimeout` | 504 | Gateway Timeout | error |
//! | `NotAcceptable` | 406 | Not Acceptable | bad |
//! | `UnsupportedMediaType` | 415 | Unsupported Media Type | bad |
//! | `BadRequest` | 400 | Bad Request | bad |
//! | `NotFound` | 404 | Not Found | bad |
//! | `MethodNotAllowed` | 405 | Method Not Allowed | bad |

use http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using [`Fault`].
pub type FaultResult<T> = Result<T, Fault>;

/// The outcome category a completed request is counted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    /// The handler completed normally.
    Successful,
    /// Completed, but worth flagging. Never produced by the built-in classifications.
    Warning,
    /// Internal or upstream fault.
    Error,
    /// Client fault.
    Bad,
}

impl Bucket {
    /// All buckets, in status-payload order.
    pub const ALL: [Bucket; 4] = [Self::Successful, Self::Warning, Self::Error, Self::Bad];

    /// Returns the bucket name as used in metric labels.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Successful => "successful",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Bad => "bad",
        }
    }
}

impl std::fmt::Display for Bucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The classification of a [`Fault`], without its payload.
///
/// `FaultKind` is `Copy` so it can travel in response extensions and be
/// read back by outer pipeline stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultKind {
    /// Unclassified or unexpected failure, including misconfiguration.
    Internal,
    /// A downstream dependency answered with an internal error.
    BadGateway,
    /// A downstream dependency could not be reached.
    GatewayTimeout,
    /// The `Accept` header cannot be satisfied.
    NotAcceptable,
    /// The request body is not JSON or does not match its schema.
    UnsupportedMediaType,
    /// The request does not conform to the API contract.
    BadRequest,
    /// The referenced resource does not exist.
    NotFound,
    /// No handler matches the method and path.
    MethodNotAllowed,
}

impl FaultKind {
    /// Every classification, in table order.
    pub const ALL: [FaultKind; 8] = [
        Self::Internal,
        Self::BadGateway,
        Self::GatewayTimeout,
        Self::NotAcceptable,
        Self::UnsupportedMediaType,
        Self::BadRequest,
        Self::NotFound,
        Self::MethodNotAllowed,
    ];

    /// Returns the HTTP status code for this kind.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BadGateway => StatusCode::BAD_GATEWAY,
            Self::GatewayTimeout => StatusCode::GATEWAY_TIMEOUT,
            Self::NotAcceptable => StatusCode::NOT_ACCEPTABLE,
            Self::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::BadRequest => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
        }
    }

    /// Returns the short label written to the envelope's `error` field.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Internal => "Internal Server Error",
            Self::BadGateway => "Bad Gateway",
            Self::GatewayTimeout => "Gateway Timeout",
            Self::NotAcceptable => "Not Acceptable",
            Self::UnsupportedMediaType => "Unsupported Media Type",
            Self::BadRequest => "Bad Request",
            Self::NotFound => "Not Found",
            Self::MethodNotAllowed => "Method Not Allowed",
        }
    }

    /// Returns the counter bucket this kind is attributed to.
    #[must_use]
    pub const fn bucket(&self) -> Bucket {
        match self {
            Self::Internal | Self::BadGateway | Self::GatewayTimeout => Bucket::Error,
            Self::NotAcceptable
            | Self::UnsupportedMediaType
            | Self::BadRequest
            | Self::NotFound
            | Self::MethodNotAllowed => Bucket::Bad,
        }
    }

    /// Returns `true` for client faults (4xx).
    #[must_use]
    pub const fn is_client_fault(&self) -> bool {
        matches!(self.bucket(), Bucket::Bad)
    }
}

/// A classified request failure.
///
/// # Example
///
/// ```
/// use smrt_core::{Fault, FaultKind};
///
/// let fault = Fault::not_acceptable(Some("text/html"));
/// assert_eq!(fault.kind(), FaultKind::NotAcceptable);
/// assert_eq!(fault.status_code().as_u16(), 406);
/// assert_eq!(
///     fault.description(),
///     "Accept type 'text/html' is not served by endpoint."
/// );
/// ```
#[derive(Error, Debug)]
pub enum Fault {
    /// Unexpected failure or server misconfiguration.
    #[error("internal error: {message}")]
    Internal {
        /// Diagnostic message (not sent to clients).
        message: String,
        /// The underlying error (not sent to clients).
        #[source]
        source: Option<anyhow::Error>,
    },

    /// A downstream dependency answered with an internal error.
    #[error("bad gateway: {message}")]
    BadGateway {
        /// Diagnostic message.
        message: String,
    },

    /// A downstream dependency was unreachable.
    #[error("gateway timeout: {message}")]
    GatewayTimeout {
        /// Diagnostic message.
        message: String,
    },

    /// The caller's `Accept` header does not match the declared outbound type.
    #[error("not acceptable: {accept:?}")]
    NotAcceptable {
        /// The raw `Accept` header, if the request carried one.
        accept: Option<String>,
    },

    /// The request body could not be parsed or failed schema validation.
    #[error("unsupported media type ({reason}): {content_type:?}")]
    UnsupportedMediaType {
        /// The raw `Content-Type` header, if the request carried one.
        content_type: Option<String>,
        /// Why the body was rejected.
        reason: String,
    },

    /// The request does not conform to the API contract.
    #[error("bad request: {message}")]
    BadRequest {
        /// Diagnostic message.
        message: String,
    },

    /// The referenced resource does not exist.
    #[error("not found: {}", .message.as_deref().unwrap_or(DEFAULT_NOT_FOUND))]
    NotFound {
        /// Message returned to the caller.
        message: Option<String>,
    },

    /// No handler matches the method at this path.
    #[error("method not allowed: {method} {path}")]
    MethodNotAllowed {
        /// Request method.
        method: String,
        /// Request path.
        path: String,
    },
}

const DEFAULT_NOT_FOUND: &str = "Resource does not exist.";

impl Fault {
    /// Creates an internal fault with a message.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an internal fault wrapping an underlying error.
    #[must_use]
    pub fn internal_with_source(
        message: impl Into<String>,
        source: impl Into<anyhow::Error>,
    ) -> Self {
        Self::Internal {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Creates a bad gateway fault.
    #[must_use]
    pub fn bad_gateway(message: impl Into<String>) -> Self {
        Self::BadGateway {
            message: message.into(),
        }
    }

    /// Creates a gateway timeout fault.
    #[must_use]
    pub fn gateway_timeout(message: impl Into<String>) -> Self {
        Self::GatewayTimeout {
            message: message.into(),
        }
    }

    /// Creates a not-acceptable fault for the given `Accept` header value.
    #[must_use]
    pub fn not_acceptable(accept: Option<&str>) -> Self {
        Self::NotAcceptable {
            accept: accept.map(str::to_string),
        }
    }

    /// Creates an unsupported-media-type fault.
    #[must_use]
    pub fn unsupported_media_type(content_type: Option<&str>, reason: impl Into<String>) -> Self {
        Self::UnsupportedMediaType {
            content_type: content_type.map(str::to_string),
            reason: reason.into(),
        }
    }

    /// Creates a bad request fault.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    /// Creates a not-found fault. The message is returned to the caller.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: Some(message.into()),
        }
    }

    /// Creates a not-found fault with the default description.
    #[must_use]
    pub fn resource_missing() -> Self {
        Self::NotFound { message: None }
    }

    /// Creates a method-not-allowed fault.
    #[must_use]
    pub fn method_not_allowed(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self::MethodNotAllowed {
            method: method.into(),
            path: path.into(),
        }
    }

    /// Returns the classification of this fault.
    #[must_use]
    pub const fn kind(&self) -> FaultKind {
        match self {
            Self::Internal { .. } => FaultKind::Internal,
            Self::BadGateway { .. } => FaultKind::BadGateway,
            Self::GatewayTimeout { .. } => FaultKind::GatewayTimeout,
            Self::NotAcceptable { .. } => FaultKind::NotAcceptable,
            Self::UnsupportedMediaType { .. } => FaultKind::UnsupportedMediaType,
            Self::BadRequest { .. } => FaultKind::BadRequest,
            Self::NotFound { .. } => FaultKind::NotFound,
            Self::MethodNotAllowed { .. } => FaultKind::MethodNotAllowed,
        }
    }

    /// Returns the HTTP status code for this fault.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        self.kind().status_code()
    }

    /// Returns the counter bucket for this fault.
    #[must_use]
    pub const fn bucket(&self) -> Bucket {
        self.kind().bucket()
    }

    /// Returns the human-readable description sent to the caller.
    #[must_use]
    pub fn description(&self) -> String {
        match self {
            Self::Internal { .. } => "An unexpected error has occurred.".to_string(),
            Self::BadGateway { .. } => "Received invalid response from proxy.".to_string(),
            Self::GatewayTimeout { .. } => "Received no response from proxy.".to_string(),
            Self::NotAcceptable { accept } => match accept.as_deref() {
                Some(value) if value != "*/*" => {
                    format!("Accept type '{value}' is not served by endpoint.")
                }
                _ => "Missing Accept header.".to_string(),
            },
            Self::UnsupportedMediaType { content_type, .. } => match content_type {
                Some(value) => format!("Content type '{value}' cannot be handled by endpoint."),
                None => "Missing Content-Type header.".to_string(),
            },
            Self::BadRequest { .. } => "Data does not conform to API specification.".to_string(),
            Self::NotFound { message } => message
                .clone()
                .unwrap_or_else(|| DEFAULT_NOT_FOUND.to_string()),
            Self::MethodNotAllowed { path, .. } => format!("No method '{path}' exist."),
        }
    }

    /// Converts this fault into the wire envelope.
    #[must_use]
    pub fn to_envelope(&self) -> ErrorEnvelope {
        let kind = self.kind();
        ErrorEnvelope {
            code: kind.status_code().as_u16(),
            error: kind.label().to_string(),
            description: self.description(),
        }
    }
}

impl From<anyhow::Error> for Fault {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

/// The fixed JSON shape of every error response.
///
/// ```json
/// { "code": 415, "error": "Unsupported Media Type", "description": "..." }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// HTTP status code.
    pub code: u16,
    /// Short error-kind label.
    pub error: String,
    /// Human-readable description.
    pub description: String,
}
