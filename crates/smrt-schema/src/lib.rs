//! # smrt Schema
//!
//! Schema lookup and structural validation for request bodies and
//! configuration files.
//!
//! - [`SchemaResolver`] maps schema names to parsed documents and caches them
//!   for the life of the process.
//! - [`validate`] checks a JSON value against a draft 6 schema.
//!   [`SchemaResolver::compiled`] keeps a [`CompiledSchema`] per name so
//!   request bodies are not recompiled each time.
//!
//! ```
//! use smrt_core::media::{schema_name, STATUS_MEDIA_TYPE};
//! use smrt_schema::{validate, SchemaResolver};
//!
//! let resolver = SchemaResolver::new();
//! let schema = resolver
//!     .resolve(&schema_name(STATUS_MEDIA_TYPE))
//!     .unwrap()
//!     .unwrap();
//! assert!(!validate(&serde_json::json!({}), &schema));
//! ```

#![doc(html_root_url = "https://docs.rs/smrt-schema/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod resolver;
mod validator;

pub use error::{SchemaError, SchemaResult};
pub use resolver::SchemaResolver;
pub use validator::{validate, violations, CompiledSchema};
