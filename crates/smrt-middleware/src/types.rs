//! Request and response types used by the pipeline, plus the conversion
//! from [`Fault`] to a wire response.

use crate::context::MiddlewareContext;
use bytes::Bytes;
use http::header::{HeaderValue, CONTENT_TYPE};
use http::StatusCode;
use http_body_util::Full;
use serde::Serialize;
use smrt_core::media::ERROR_MEDIA_TYPE;
use smrt_core::{Fault, FaultKind};

/// The HTTP request type used in the pipeline.
pub type Request = http::Request<Full<Bytes>>;

/// The HTTP response type used in the pipeline.
pub type Response = http::Response<Full<Bytes>>;

/// What a handler or stage produces: a response, or a classified fault.
pub type HandlerResult = Result<Response, Fault>;

/// Extension trait for building smrt responses.
pub trait ResponseExt {
    /// Builds the error envelope response for a fault.
    ///
    /// The response carries the fault's [`FaultKind`] in its extensions so
    /// that outer stages can count it without re-classifying.
    fn from_fault(fault: &Fault) -> Response;

    /// Serializes `body` as JSON with the given status and content type.
    fn json<T: Serialize>(status: StatusCode, content_type: &str, body: &T) -> HandlerResult;

    /// Returns the fault classification attached by [`ResponseExt::from_fault`].
    fn fault_kind(&self) -> Option<FaultKind>;
}

impl ResponseExt for Response {
    fn from_fault(fault: &Fault) -> Response {
        let kind = fault.kind();
        // An envelope holds three plain fields; serializing it cannot fail.
        let body = serde_json::to_vec(&fault.to_envelope()).unwrap_or_default();

        let mut response = http::Response::new(Full::new(Bytes::from(body)));
        *response.status_mut() = kind.status_code();
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static(ERROR_MEDIA_TYPE));
        response.extensions_mut().insert(kind);
        response
    }

    fn json<T: Serialize>(status: StatusCode, content_type: &str, body: &T) -> HandlerResult {
        let body = serde_json::to_vec(body)
            .map_err(|e| Fault::internal_with_source("failed to serialize response", e))?;
        let content_type = HeaderValue::from_str(content_type)
            .map_err(|e| Fault::internal_with_source("invalid content type", e))?;

        let mut response = http::Response::new(Full::new(Bytes::from(body)));
        *response.status_mut() = status;
        response.headers_mut().insert(CONTENT_TYPE, content_type);
        Ok(response)
    }

    fn fault_kind(&self) -> Option<FaultKind> {
        self.extensions().get::<FaultKind>().copied()
    }
}

/// Logs a fault at the severity its kind calls for and converts it to the
/// envelope response.
///
/// Internal faults log at `error` with the full source chain, upstream
/// faults at `warn`, client faults at `debug`.
pub fn fault_response(ctx: &MiddlewareContext, fault: &Fault) -> Response {
    let kind = fault.kind();
    let request_id = ctx.request_id();

    match kind {
        FaultKind::Internal => tracing::error!(
            %request_id,
            error = %error_chain(fault),
            "request failed with internal error"
        ),
        FaultKind::BadGateway | FaultKind::GatewayTimeout => tracing::warn!(
            %request_id,
            error = %fault,
            "downstream dependency failed"
        ),
        _ => tracing::debug!(%request_id, error = %fault, "request rejected"),
    }

    Response::from_fault(fault)
}

/// A header value as text for fault descriptions. Bytes that are not UTF-8
/// are replaced rather than dropped.
pub(crate) fn header_text(value: &HeaderValue) -> String {
    String::from_utf8_lossy(value.as_bytes()).into_owned()
}

fn error_chain(err: &dyn std::error::Error) -> String {
    let mut chain = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        chain.push_str(": ");
        chain.push_str(&cause.to_string());
        source = cause.source();
    }
    chain
}
