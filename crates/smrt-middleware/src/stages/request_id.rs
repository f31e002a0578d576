//! Request id stage.
//!
//! Takes the id from an incoming `X-Request-Id` header when it is a valid
//! UUID, otherwise generates a UUID v7. The id is stored in the context,
//! attached to a tracing span covering the rest of the chain, and echoed on
//! the response.

use crate::context::MiddlewareContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{Request, Response};
use http::HeaderValue;
use smrt_core::{RequestId, REQUEST_ID_HEADER};
use tracing::Instrument;

/// Assigns every request an id.
#[derive(Debug, Clone)]
pub struct RequestIdStage {
    trust_incoming: bool,
}

impl RequestIdStage {
    /// Creates a stage that honours incoming `X-Request-Id` headers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            trust_incoming: true,
        }
    }

    /// Creates a stage that always generates a fresh id.
    #[must_use]
    pub fn always_generate() -> Self {
        Self {
            trust_incoming: false,
        }
    }

    fn incoming(&self, request: &Request) -> Option<RequestId> {
        if !self.trust_incoming {
            return None;
        }
        request
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(RequestId::parse)
    }
}

impl Default for RequestIdStage {
    fn default() -> Self {
        Self::new()
    }
}

impl Middleware for RequestIdStage {
    fn name(&self) -> &'static str {
        "request_id"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let request_id = self.incoming(&request).unwrap_or_else(RequestId::new);
            ctx.set_request_id(request_id);

            let span = tracing::info_span!(
                "request",
                request_id = %request_id,
                http.method = %request.method(),
                http.path = %request.uri().path(),
            );
            let mut response = next.run(ctx, request).instrument(span).await;

            if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
                response.headers_mut().insert(REQUEST_ID_HEADER, value);
            }
            response
        })
    }
}
