//! Broadcast error types.

use std::net::SocketAddr;
use thiserror::Error;

/// Errors raised by the broadcaster and the listener.
#[derive(Debug, Error)]
pub enum BroadcastError {
    /// The socket could not be bound.
    #[error("failed to bind UDP socket to {addr}: {source}")]
    Bind {
        /// The address.
        addr: SocketAddr,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Sending a datagram failed.
    #[error("failed to send broadcast to {target}: {source}")]
    Send {
        /// Destination of the datagram.
        target: SocketAddr,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The message does not fit in one datagram.
    #[error("message of {size} bytes exceeds the {max} byte datagram limit")]
    MessageTooLarge {
        /// Message length.
        size: usize,
        /// Largest message a listener reads.
        max: usize,
    },

    /// `start` was called on a listener that is already running.
    #[error("listener is already running")]
    AlreadyRunning,

    /// Other socket I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for broadcast operations.
pub type BroadcastResult<T> = Result<T, BroadcastError>;
