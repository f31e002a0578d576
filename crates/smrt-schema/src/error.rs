//! Schema error types.

use smrt_core::Fault;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading a schema document that exists on disk.
///
/// A schema that cannot be found at all is not an error; resolution
/// returns `None` instead.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// The schema file exists but could not be read.
    #[error("failed to read schema {path}: {source}")]
    Read {
        /// Path of the schema file.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The schema file is not valid JSON.
    #[error("failed to parse schema {path}: {source}")]
    Parse {
        /// Path of the schema file.
        path: PathBuf,
        /// The underlying parse error.
        #[source]
        source: serde_json::Error,
    },

    /// A bundled schema is not valid JSON.
    #[error("bundled schema {name} is malformed: {source}")]
    Bundled {
        /// Schema name.
        name: String,
        /// The underlying parse error.
        #[source]
        source: serde_json::Error,
    },
}

impl From<SchemaError> for Fault {
    fn from(err: SchemaError) -> Self {
        Fault::internal_with_source("could not load schema", err)
    }
}

/// Result type alias for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;
