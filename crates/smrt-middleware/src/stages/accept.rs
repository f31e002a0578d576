//! Accept check stage.
//!
//! For routes that produce a media type, the request's `Accept` header must
//! admit it (exactly, or through `*/*` / `type/*`). A missing header or a
//! mismatch yields 406 before the handler runs. Successful responses are
//! labelled with the declared media type.

use crate::context::MiddlewareContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{fault_response, header_text, Request, Response};
use http::header::{ACCEPT, CONTENT_TYPE};
use http::HeaderValue;
use smrt_core::media::accepts;
use smrt_core::Fault;

/// Enforces the declared outbound media type.
#[derive(Debug, Clone)]
pub struct AcceptStage {
    media_type: String,
}

impl AcceptStage {
    /// Creates a stage for routes producing `media_type`.
    #[must_use]
    pub fn new(media_type: impl Into<String>) -> Self {
        Self {
            media_type: media_type.into(),
        }
    }

    fn check(&self, accept: Option<&str>) -> Result<(), Fault> {
        match accept {
            Some(value) if accepts(value, &self.media_type) => Ok(()),
            _ => Err(Fault::not_acceptable(accept)),
        }
    }
}

impl Middleware for AcceptStage {
    fn name(&self) -> &'static str {
        "accept_check"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let accept = request.headers().get(ACCEPT).map(header_text);

            if let Err(fault) = self.check(accept.as_deref()) {
                return fault_response(ctx, &fault);
            }

            let mut response = next.run(ctx, request).await;
            if response.status().is_success() {
                if let Ok(value) = HeaderValue::from_str(&self.media_type) {
                    response.headers_mut().insert(CONTENT_TYPE, value);
                }
            }
            response
        })
    }
}
