//! # smrt Middleware
//!
//! The responder: an ordered middleware chain that wraps a request handler,
//! checks inbound content and outbound representation, times the handler,
//! and turns every [`Fault`](smrt_core::Fault) into the uniform error
//! envelope while counting the outcome.
//!
//! ## Pipeline Stages
//!
//! ```text
//! Request → RequestId → Outcome → ContentCheck → AcceptCheck → Timing → Handler
//!                          ↑                                              │
//! Response ←───────────────┴───────────── Result<Response, Fault> ←──────┘
//! ```
//!
//! | Stage | Purpose |
//! |-------|---------|
//! | Request ID | Propagate or generate the request id (UUID v7) |
//! | Outcome | Count the response in one bucket, emit metrics |
//! | Content check | `Content-Type`, JSON parse, schema validation (415 / 500) |
//! | Accept check | `Accept` negotiation (406), label the response |
//! | Timing | Log handler duration in ms |
//!
//! Handlers return `Result<Response, Fault>`. A fault is converted into its
//! envelope response once, where it is raised, and counted by the outcome
//! stage through the [`FaultKind`](smrt_core::FaultKind) the response carries.

#![doc(html_root_url = "https://docs.rs/smrt-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod context;
pub mod middleware;
pub mod pipeline;
pub mod stages;
pub mod types;

pub use context::{JsonBody, MiddlewareContext};
pub use middleware::{BoxFuture, Middleware, Next};
pub use pipeline::{ContentContract, Pipeline, PipelineBuilder, Stage};
pub use types::{fault_response, HandlerResult, Request, Response, ResponseExt};
