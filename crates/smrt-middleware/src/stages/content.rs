//! Content check stage.
//!
//! For routes that consume a media type:
//!
//! 1. `Content-Type` must name that media type, else 415.
//! 2. The body must parse as JSON, else 415 ("could not verify schema").
//! 3. The schema named after the media type must resolve, else 500
//!    ("could not find schema"). A missing schema is a deployment defect.
//! 4. The body must validate against the schema, else 415.
//!
//! The parsed body is stored in the context as [`JsonBody`].

use crate::context::{JsonBody, MiddlewareContext};
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{fault_response, header_text, Request, Response};
use http::header::CONTENT_TYPE;
use http_body_util::{BodyExt, Full};
use serde_json::Value;
use smrt_core::media::{same_type, schema_name};
use smrt_core::Fault;
use smrt_schema::SchemaResolver;
use std::sync::Arc;

/// Validates inbound bodies against the schema for a media type.
#[derive(Debug, Clone)]
pub struct ContentStage {
    media_type: String,
    schema: String,
    resolver: Arc<SchemaResolver>,
}

impl ContentStage {
    /// Creates a stage requiring `media_type` bodies.
    #[must_use]
    pub fn new(media_type: impl Into<String>, resolver: Arc<SchemaResolver>) -> Self {
        let media_type = media_type.into();
        let schema = schema_name(&media_type);
        Self {
            media_type,
            schema,
            resolver,
        }
    }

    /// Returns the schema name bodies are validated against.
    #[must_use]
    pub fn schema(&self) -> &str {
        &self.schema
    }

    fn check(&self, content_type: Option<&str>, body: &[u8]) -> Result<Value, Fault> {
        match content_type {
            Some(value) if same_type(value, &self.media_type) => {}
            Some(_) => {
                return Err(Fault::unsupported_media_type(
                    content_type,
                    format!("expected {}", self.media_type),
                ))
            }
            None => return Err(Fault::unsupported_media_type(None, "missing content type")),
        }

        let instance: Value = serde_json::from_slice(body)
            .map_err(|_| Fault::unsupported_media_type(content_type, "could not verify schema"))?;

        let schema = self
            .resolver
            .compiled(&self.schema)?
            .ok_or_else(|| Fault::internal(format!("could not find schema {}", self.schema)))?;

        let violations = schema.violations(&instance);
        if !violations.is_empty() {
            return Err(Fault::unsupported_media_type(
                content_type,
                violations.join("; "),
            ));
        }

        Ok(instance)
    }
}

impl Middleware for ContentStage {
    fn name(&self) -> &'static str {
        "content_check"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let (parts, body) = request.into_parts();
            let bytes = match body.collect().await {
                Ok(collected) => collected.to_bytes(),
                Err(never) => match never {},
            };

            let content_type = parts.headers.get(CONTENT_TYPE).map(header_text);

            match self.check(content_type.as_deref(), &bytes) {
                Ok(instance) => {
                    ctx.set_extension(JsonBody(instance));
                    let request = Request::from_parts(parts, Full::new(bytes));
                    next.run(ctx, request).await
                }
                Err(fault) => fault_response(ctx, &fault),
            }
        })
    }
}
