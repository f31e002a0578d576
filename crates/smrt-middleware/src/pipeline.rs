//! Ordered middleware pipeline.
//!
//! A [`Pipeline`] is an ordered list of stages wrapped around a handler.
//! [`Pipeline::responder`] assembles the standard chain for a route from its
//! [`ContentContract`]:
//!
//! ```text
//! Request → RequestId → Outcome → ContentCheck? → AcceptCheck? → Timing → Handler
//! ```
//!
//! `ContentCheck` is present only when the route consumes a media type and
//! `AcceptCheck` only when it produces one. `Outcome` sits directly inside
//! `RequestId`, so a fault from any inner stage or from the handler is
//! counted exactly once.

use crate::context::MiddlewareContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::stages::{AcceptStage, ContentStage, OutcomeStage, RequestIdStage, TimingStage};
use crate::types::{HandlerResult, Request, Response};
use smrt_core::ServiceState;
use smrt_schema::SchemaResolver;
use std::sync::Arc;

/// A type-erased stage.
pub type BoxedMiddleware = Arc<dyn Middleware>;

/// The media types a route consumes and produces.
///
/// Fixed when the route is defined.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentContract {
    /// Required `Content-Type` of the request body.
    pub consumes: Option<String>,
    /// Media type of successful responses; also what `Accept` must admit.
    pub produces: Option<String>,
}

impl ContentContract {
    /// A contract with no inbound or outbound requirement.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Requires request bodies of `media_type`.
    #[must_use]
    pub fn consumes(mut self, media_type: impl Into<String>) -> Self {
        self.consumes = Some(media_type.into());
        self
    }

    /// Declares responses of `media_type`.
    #[must_use]
    pub fn produces(mut self, media_type: impl Into<String>) -> Self {
        self.produces = Some(media_type.into());
        self
    }
}

/// Identifies the stages of the standard chain, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    /// Assign or propagate the request id.
    RequestId,
    /// Count the outcome and emit request metrics.
    Outcome,
    /// Check `Content-Type`, parse and validate the body.
    ContentCheck,
    /// Check `Accept` against the declared outbound type.
    AcceptCheck,
    /// Measure handler execution time.
    Timing,
}

impl Stage {
    /// Returns the stage name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::RequestId => "request_id",
            Self::Outcome => "outcome",
            Self::ContentCheck => "content_check",
            Self::AcceptCheck => "accept_check",
            Self::Timing => "timing",
        }
    }

    /// Returns every stage in chain order.
    #[must_use]
    pub const fn all() -> [Stage; 5] {
        [
            Self::RequestId,
            Self::Outcome,
            Self::ContentCheck,
            Self::AcceptCheck,
            Self::Timing,
        ]
    }
}

/// An ordered chain of stages.
///
/// # Example
///
/// ```ignore
/// let pipeline = Pipeline::responder(&contract, state.clone(), resolver.clone());
/// let response = pipeline
///     .process(MiddlewareContext::new(), request, |ctx, _req| {
///         let body = ctx.json_body().cloned();
///         Box::pin(async move { handle(body).await })
///     })
///     .await;
/// ```
pub struct Pipeline {
    stages: Vec<BoxedMiddleware>,
}

impl Pipeline {
    /// Creates a new pipeline builder.
    #[must_use]
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    /// Builds the standard chain for a route.
    #[must_use]
    pub fn responder(
        contract: &ContentContract,
        state: Arc<ServiceState>,
        resolver: Arc<SchemaResolver>,
    ) -> Self {
        let mut builder = Self::builder()
            .stage(RequestIdStage::new())
            .stage(OutcomeStage::new(state));

        if let Some(media_type) = &contract.consumes {
            builder = builder.stage(ContentStage::new(media_type.clone(), resolver));
        }
        if let Some(media_type) = &contract.produces {
            builder = builder.stage(AcceptStage::new(media_type.clone()));
        }

        builder.stage(TimingStage).build()
    }

    /// Builds the chain used for requests that match no route: request id
    /// and outcome only, so the rejection is still counted.
    #[must_use]
    pub fn fallback(state: Arc<ServiceState>) -> Self {
        Self::builder()
            .stage(RequestIdStage::new())
            .stage(OutcomeStage::new(state))
            .build()
    }

    /// Runs `request` through every stage and then `handler`.
    pub async fn process<H>(&self, mut ctx: MiddlewareContext, request: Request, handler: H) -> Response
    where
        H: FnOnce(&mut MiddlewareContext, Request) -> BoxFuture<'static, HandlerResult>
            + Send
            + 'static,
    {
        let next = self.build_chain(handler);
        next.run(&mut ctx, request).await
    }

    fn build_chain<'a, H>(&'a self, handler: H) -> Next<'a>
    where
        H: FnOnce(&mut MiddlewareContext, Request) -> BoxFuture<'static, HandlerResult> + Send + 'a,
    {
        let mut next = Next::handler(handler);
        for middleware in self.stages.iter().rev() {
            next = Next::new(middleware.as_ref(), next);
        }
        next
    }

    /// Returns the stage names in order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    /// Returns the number of stages.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("stages", &self.stage_names())
            .finish()
    }
}

/// Builder for a [`Pipeline`].
#[derive(Default)]
pub struct PipelineBuilder {
    stages: Vec<BoxedMiddleware>,
}

impl PipelineBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a stage. Stages run in the order they are added.
    #[must_use]
    pub fn stage<M: Middleware>(mut self, middleware: M) -> Self {
        self.stages.push(Arc::new(middleware));
        self
    }

    /// Builds the pipeline.
    #[must_use]
    pub fn build(self) -> Pipeline {
        Pipeline {
            stages: self.stages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> Arc<SchemaResolver> {
        Arc::new(SchemaResolver::with_root(std::env::temp_dir()))
    }

    #[test]
    fn test_stage_order_is_stable() {
        let names: Vec<_> = Stage::all().iter().map(|s| s.name()).collect();
        assert_eq!(
            names,
            ["request_id", "outcome", "content_check", "accept_check", "timing"]
        );
    }

    #[test]
    fn test_responder_without_contract() {
        let pipeline = Pipeline::responder(
            &ContentContract::none(),
            Arc::new(ServiceState::new()),
            resolver(),
        );
        assert_eq!(pipeline.stage_names(), ["request_id", "outcome", "timing"]);
    }

    #[test]
    fn test_responder_with_full_contract() {
        let contract = ContentContract::none()
            .consumes("application/se.novafaen.lamp.v1+json")
            .produces("application/se.novafaen.lamp.v1+json");
        let pipeline = Pipeline::responder(&contract, Arc::new(ServiceState::new()), resolver());
        assert_eq!(
            pipeline.stage_names(),
            ["request_id", "outcome", "content_check", "accept_check", "timing"]
        );
    }

    #[test]
    fn test_fallback_pipeline() {
        let pipeline = Pipeline::fallback(Arc::new(ServiceState::new()));
        assert_eq!(pipeline.stage_count(), 2);
    }
}
