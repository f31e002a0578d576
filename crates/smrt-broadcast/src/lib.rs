//! # smrt Broadcast
//!
//! Local network broadcast for announcing services and sharing small
//! pieces of configuration between them.
//!
//! - [`Broadcaster`] sends a string as one UDP datagram to
//!   `255.255.255.255` on a configurable port (default [`DEFAULT_PORT`])
//! - [`Listener`] receives datagrams on a background thread and passes the raw
//!   bytes to a callback, with an explicit start/stop lifecycle
//!
//! ## Example
//!
//! ```rust,ignore
//! use smrt_broadcast::{Broadcaster, Listener};
//!
//! let listener = Listener::new(|bytes| println!("{}", String::from_utf8_lossy(bytes)));
//! listener.start()?;
//!
//! Broadcaster::new().broadcast("lamp-service up").await?;
//!
//! listener.stop().await;
//! ```

#![doc(html_root_url = "https://docs.rs/smrt-broadcast/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod broadcaster;
mod error;
mod listener;

pub use broadcaster::Broadcaster;
pub use error::{BroadcastError, BroadcastResult};
pub use listener::{Callback, Listener};

/// Default broadcast port.
pub const DEFAULT_PORT: u16 = 28015;

/// Largest datagram a listener reads; longer messages are refused on send.
pub const MAX_DATAGRAM: usize = 1024;

/// Counter incremented for every datagram sent.
pub const BROADCASTS_TOTAL: &str = "smrt_broadcasts_total";
