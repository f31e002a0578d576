//! # smrt Client
//!
//! Outbound HTTP for handlers that call other services. Failures come back
//! as [`ClientError`], which converts into the matching [`Fault`] so a
//! handler can simply use `?`:
//!
//! - no response (connection refused, timeout) → 504
//! - downstream `500` → 502
//! - unsupported method or malformed URL → 500
//!
//! The id of the request being handled is sent as `X-Request-Id`.
//!
//! ```rust,ignore
//! use smrt_client::Client;
//!
//! async fn switch(ctx: HandlerContext, client: Client) -> HandlerResult {
//!     let lamp: Lamp = client
//!         .put("http://lamps.local/lamps/kitchen")
//!         .request_id(ctx.request_id())
//!         .json(&serde_json::json!({"on": true}))
//!         .send()
//!         .await?
//!         .json()?;
//!     Response::json(StatusCode::OK, LAMP, &lamp)
//! }
//! ```
//!
//! [`Fault`]: smrt_core::Fault

#![doc(html_root_url = "https://docs.rs/smrt-client/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod client;
mod error;

pub use client::{Client, ClientResponse, OutboundRequest, DEFAULT_TIMEOUT, SUPPORTED_METHODS};
pub use error::{ClientError, ClientResult};
