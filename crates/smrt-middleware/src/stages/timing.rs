//! Handler timing.
//!
//! Logs how long the handler took, in milliseconds. Diagnostic only; slow
//! handlers are never aborted.

use crate::context::MiddlewareContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{Request, Response};
use std::time::{Duration, Instant};

/// Elapsed handler time, stored in the context after the handler returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandlerTiming(pub Duration);

/// Measures handler execution time.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimingStage;

impl Middleware for TimingStage {
    fn name(&self) -> &'static str {
        "timing"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let path = request.uri().path().to_string();
            let start = Instant::now();

            let response = next.run(ctx, request).await;

            let elapsed = start.elapsed();
            ctx.set_extension(HandlerTiming(elapsed));
            tracing::debug!(
                request_id = %ctx.request_id(),
                duration_ms = elapsed.as_millis() as u64,
                "{} executed in {} ms",
                path,
                elapsed.as_millis()
            );
            response
        })
    }
}
