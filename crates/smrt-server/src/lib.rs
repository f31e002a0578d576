//! # smrt Server
//!
//! HTTP server for smrt services:
//!
//! - Hyper/Tokio HTTP/1.1 server with graceful shutdown
//! - Route table with a per-route Content-Type contract
//! - Built-in `GET /status` and `GET|PUT /test/error`
//! - Unmatched paths and methods answered with 405
//!
//! ## Example
//!
//! ```rust,ignore
//! use smrt_server::{RouteSpec, Server};
//!
//! let server = Server::builder()
//!     .http_addr("0.0.0.0:8080")
//!     .route(RouteSpec::get("/lamps").produces(LAMPS), list_lamps)
//!     .build()?;
//! server.run().await?;
//! ```

#![doc(html_root_url = "https://docs.rs/smrt-server/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod config;
pub mod endpoints;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;
pub mod shutdown;

pub use config::{ServerConfig, ServerConfigBuilder};
pub use error::{ServerError, ServerResult};
pub use handler::{erase, ErasedHandler, HandlerContext};
pub use router::{RouteLookup, RouteMatch, RouteSpec, Router};
pub use server::{Server, ServerBuilder};
pub use shutdown::{ConnectionTracker, ShutdownSignal};
