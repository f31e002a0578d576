//! # smrt Core
//!
//! Core types for the smrt framework.
//!
//! - [`Fault`] / [`FaultKind`] - the classified failures a request can end in
//! - [`ErrorEnvelope`] - the `{code, error, description}` wire shape
//! - [`Bucket`] - the four outcome counters
//! - [`ServiceState`] - process-lifetime counters and the registered application
//! - [`Application`] - the capability set a hosting application implements
//! - [`RequestId`] - UUID v7 request identifier
//! - [`media`] - vendor media types, schema names and `Accept` matching

#![doc(html_root_url = "https://docs.rs/smrt-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod application;
mod fault;
pub mod media;
mod request_id;
mod state;

pub use application::{Application, ApplicationStatus};
pub use fault::{Bucket, ErrorEnvelope, Fault, FaultKind, FaultResult};
pub use request_id::{RequestId, REQUEST_ID_HEADER};
pub use state::{Counters, FrameworkStatus, ServiceState, StateError, StatusSnapshot};
