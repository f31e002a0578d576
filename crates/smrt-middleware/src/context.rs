//! Per-request state carried through the pipeline.

use serde_json::Value;
use smrt_core::RequestId;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::time::Instant;

/// A request body that has been parsed and validated against its schema.
///
/// Stored in the context by the content-check stage; handlers read it
/// instead of parsing the body again.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonBody(pub Value);

/// Context that flows through the middleware pipeline.
///
/// # Example
///
/// ```
/// use smrt_middleware::context::MiddlewareContext;
///
/// #[derive(Debug, PartialEq)]
/// struct Room(&'static str);
///
/// let mut ctx = MiddlewareContext::new();
/// ctx.set_extension(Room("kitchen"));
/// assert_eq!(ctx.get_extension::<Room>(), Some(&Room("kitchen")));
/// ```
#[derive(Debug)]
pub struct MiddlewareContext {
    request_id: RequestId,
    route: Option<String>,
    started_at: Instant,
    extensions: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl MiddlewareContext {
    /// Creates a context with a fresh request id.
    #[must_use]
    pub fn new() -> Self {
        Self::with_request_id(RequestId::new())
    }

    /// Creates a context with a specific request id.
    #[must_use]
    pub fn with_request_id(request_id: RequestId) -> Self {
        Self {
            request_id,
            route: None,
            started_at: Instant::now(),
            extensions: HashMap::new(),
        }
    }

    /// Returns the request id.
    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Sets the request id. Only the request-id stage should call this.
    pub fn set_request_id(&mut self, request_id: RequestId) {
        self.request_id = request_id;
    }

    /// Returns the matched route pattern, if routing has run.
    #[must_use]
    pub fn route(&self) -> Option<&str> {
        self.route.as_deref()
    }

    /// Records the matched route pattern.
    pub fn set_route(&mut self, route: impl Into<String>) {
        self.route = Some(route.into());
    }

    /// Returns when the request entered the pipeline.
    #[must_use]
    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    /// Returns the time since the request entered the pipeline.
    #[must_use]
    pub fn elapsed(&self) -> std::time::Duration {
        self.started_at.elapsed()
    }

    /// Returns the validated JSON body, if the route declared an inbound type.
    #[must_use]
    pub fn json_body(&self) -> Option<&Value> {
        self.get_extension::<JsonBody>().map(|body| &body.0)
    }

    /// Stores a typed extension value, replacing any previous value of `T`.
    pub fn set_extension<T: Send + Sync + 'static>(&mut self, value: T) {
        self.extensions.insert(TypeId::of::<T>(), Box::new(value));
    }

    /// Retrieves a typed extension value.
    #[must_use]
    pub fn get_extension<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.extensions
            .get(&TypeId::of::<T>())
            .and_then(|v| v.downcast_ref())
    }

    /// Removes and returns a typed extension value.
    pub fn remove_extension<T: Send + Sync + 'static>(&mut self) -> Option<T> {
        self.extensions
            .remove(&TypeId::of::<T>())
            .and_then(|v| v.downcast().ok())
            .map(|b| *b)
    }
}

impl Default for MiddlewareContext {
    fn default() -> Self {
        Self::new()
    }
}
