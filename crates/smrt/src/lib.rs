//! # smrt
//!
//! **Content negotiation, fault mapping and service status for small HTTP
//! services.**
//!
//! - **Per-route content contracts**: a declared inbound media type is
//!   checked and its body validated against the matching JSON schema; a
//!   declared outbound type is negotiated against `Accept`
//! - **One fault taxonomy**: handlers return [`Fault`](prelude::Fault)s,
//!   which become `{code, error, description}` envelopes with the right
//!   status code
//! - **Service status**: every completed request is counted in one of four
//!   buckets and reported by `GET /status` together with the registered
//!   application's own status
//! - **Local network broadcast** and an outbound client that maps
//!   downstream failures onto 502/504
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use smrt::prelude::*;
//!
//! const LAMP: &str = "application/se.novafaen.lamp.v1+json";
//!
//! async fn switch(ctx: HandlerContext) -> HandlerResult {
//!     let body = ctx.body().cloned().unwrap_or_default();
//!     Response::json(StatusCode::OK, LAMP, &body)
//! }
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = ConfigLoader::new().with_env_prefix("SMRT").load()?;
//!     smrt::telemetry::init_telemetry(&settings.logging)?;
//!
//!     smrt::server_builder(&settings)
//!         .application(Lamps)
//!         .route(RouteSpec::put("/lamps/{name}").consumes(LAMP).produces(LAMP), switch)
//!         .build()?
//!         .run()
//!         .await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Request flow
//!
//! ```text
//! Request → RequestId → Outcome → ContentCheck → Accept → Timing → Handler
//!                          ↓
//!                  bucket counters, metrics, error envelope
//! ```

#![doc(html_root_url = "https://docs.rs/smrt/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

use std::sync::Arc;

mod app;

pub use app::AppContext;

pub use smrt_broadcast as broadcast;
pub use smrt_client as client;
pub use smrt_config as config;
pub use smrt_core as core;
pub use smrt_middleware as middleware;
pub use smrt_schema as schema;
pub use smrt_server as server;
pub use smrt_telemetry as telemetry;

use smrt_config::SmrtConfig;
use smrt_schema::SchemaResolver;
use smrt_server::{Server, ServerBuilder, ServerConfig};

/// A server builder configured from framework settings: bind address,
/// shutdown timeout and the explicit schema directory.
pub fn server_builder(settings: &SmrtConfig) -> ServerBuilder {
    let resolver = match &settings.schemas.path {
        Some(path) => SchemaResolver::new().with_search_path(path),
        None => SchemaResolver::new(),
    };
    Server::builder()
        .config(ServerConfig::from(&settings.server))
        .resolver(Arc::new(resolver))
}

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use smrt::prelude::*;
/// ```
pub mod prelude {
    pub use crate::AppContext;

    pub use smrt_core::media::{ERROR_MEDIA_TYPE, STATUS_MEDIA_TYPE};
    pub use smrt_core::{
        Application, ApplicationStatus, Bucket, ErrorEnvelope, Fault, FaultKind, RequestId,
        ServiceState, StatusSnapshot,
    };

    pub use smrt_middleware::{HandlerResult, Request, Response, ResponseExt};

    pub use smrt_server::{HandlerContext, RouteSpec, Server, ServerBuilder, ShutdownSignal};

    pub use smrt_config::{AppConfigLoader, ConfigLoader, SmrtConfig};

    pub use smrt_broadcast::{Broadcaster, Listener};

    pub use smrt_client::{Client, ClientError};

    pub use http::StatusCode;
}
