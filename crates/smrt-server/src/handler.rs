//! Handler types and dispatch helpers.
//!
//! A handler is an async function from [`HandlerContext`] to
//! [`HandlerResult`]. Returning a [`Fault`] is the normal way to fail; a
//! panic is caught and reported as an internal fault.
//!
//! ```rust,ignore
//! async fn switch(ctx: HandlerContext) -> HandlerResult {
//!     let name = ctx.param("name").ok_or_else(Fault::resource_missing)?;
//!     let body = ctx.body().ok_or_else(|| Fault::bad_request("no body"))?;
//!     Response::json(StatusCode::OK, LAMP, &lamps.set(name, body)?)
//! }
//! ```

use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use serde::de::DeserializeOwned;
use serde_json::Value;
use smrt_core::{Fault, RequestId};
use smrt_middleware::{BoxFuture, HandlerResult, Request};

/// A type-erased handler.
pub type ErasedHandler = Arc<dyn Fn(HandlerContext) -> BoxFuture<'static, HandlerResult> + Send + Sync>;

/// Everything a handler gets for one request.
#[derive(Debug)]
pub struct HandlerContext {
    request_id: RequestId,
    params: HashMap<String, String>,
    body: Option<Value>,
    request: Request,
}

impl HandlerContext {
    /// Creates a context.
    #[must_use]
    pub fn new(
        request_id: RequestId,
        params: HashMap<String, String>,
        body: Option<Value>,
        request: Request,
    ) -> Self {
        Self {
            request_id,
            params,
            body,
            request,
        }
    }

    /// The request id, also sent back as `X-Request-Id`.
    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// A path parameter by name.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// All path parameters.
    #[must_use]
    pub fn params(&self) -> &HashMap<String, String> {
        &self.params
    }

    /// The request body, already parsed and schema-checked when the route
    /// declares an inbound media type.
    #[must_use]
    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    /// Deserializes the validated body.
    ///
    /// A missing or mismatching body is the caller's fault (400).
    pub fn body_as<T: DeserializeOwned>(&self) -> Result<T, Fault> {
        let body = self
            .body
            .clone()
            .ok_or_else(|| Fault::bad_request("request has no JSON body"))?;
        serde_json::from_value(body).map_err(|e| Fault::bad_request(e.to_string()))
    }

    /// The raw request.
    #[must_use]
    pub fn request(&self) -> &Request {
        &self.request
    }
}

/// Erases an async handler function.
pub fn erase<F, Fut>(handler: F) -> ErasedHandler
where
    F: Fn(HandlerContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    Arc::new(move |ctx| Box::pin(handler(ctx)))
}

/// Invokes `handler`, turning a panic into an internal fault.
pub(crate) fn invoke(handler: &ErasedHandler, ctx: HandlerContext) -> BoxFuture<'static, HandlerResult> {
    let future = match std::panic::catch_unwind(AssertUnwindSafe(|| handler(ctx))) {
        Ok(future) => future,
        Err(panic) => return Box::pin(async move { Err(panic_fault(&*panic)) }),
    };

    Box::pin(async move {
        match AssertUnwindSafe(future).catch_unwind().await {
            Ok(result) => result,
            Err(panic) => Err(panic_fault(&*panic)),
        }
    })
}

fn panic_fault(panic: &(dyn Any + Send)) -> Fault {
    let message = panic
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    Fault::internal(format!("handler panicked: {message}"))
}
