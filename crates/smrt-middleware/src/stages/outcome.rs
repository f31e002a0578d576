//! Outcome stage.
//!
//! Attributes every completed request to exactly one [`Bucket`] and
//! increments the matching counter on the shared [`ServiceState`].
//!
//! Responses built from a fault carry its [`FaultKind`](smrt_core::FaultKind)
//! and are counted by it. Other responses are counted by status: 5xx as
//! `error`, 4xx as `bad`, anything else as `successful`.
//!
//! Also emits `smrt_requests_total` and `smrt_request_duration_seconds`
//! through the `metrics` facade.

use crate::context::MiddlewareContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{Request, Response, ResponseExt};
use http::StatusCode;
use smrt_core::{Bucket, ServiceState};
use std::sync::Arc;

/// Counter name for completed requests, labelled by `bucket`.
pub const REQUESTS_TOTAL: &str = "smrt_requests_total";

/// Histogram name for request duration, labelled by `bucket`.
pub const REQUEST_DURATION: &str = "smrt_request_duration_seconds";

/// Counts request outcomes.
#[derive(Debug, Clone)]
pub struct OutcomeStage {
    state: Arc<ServiceState>,
}

impl OutcomeStage {
    /// Creates a stage recording into `state`.
    #[must_use]
    pub fn new(state: Arc<ServiceState>) -> Self {
        Self { state }
    }
}

/// Determines the bucket for a finished response.
#[must_use]
pub fn classify(response: &Response) -> Bucket {
    if let Some(kind) = response.fault_kind() {
        return kind.bucket();
    }
    bucket_for_status(response.status())
}

fn bucket_for_status(status: StatusCode) -> Bucket {
    if status.is_server_error() {
        Bucket::Error
    } else if status.is_client_error() {
        Bucket::Bad
    } else {
        Bucket::Successful
    }
}

impl Middleware for OutcomeStage {
    fn name(&self) -> &'static str {
        "outcome"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let response = next.run(ctx, request).await;

            let bucket = classify(&response);
            self.state.record_outcome(bucket);

            let elapsed = ctx.elapsed();
            metrics::counter!(REQUESTS_TOTAL, "bucket" => bucket.as_str()).increment(1);
            metrics::histogram!(REQUEST_DURATION, "bucket" => bucket.as_str())
                .record(elapsed.as_secs_f64());

            tracing::debug!(
                request_id = %ctx.request_id(),
                http.status_code = response.status().as_u16(),
                bucket = %bucket,
                duration_ms = elapsed.as_millis() as u64,
                "request completed"
            );

            response
        })
    }
}
