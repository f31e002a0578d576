//! Sending side.

use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};

use metrics::counter;
use tokio::net::UdpSocket;
use tracing::debug;

use crate::error::{BroadcastError, BroadcastResult};
use crate::{BROADCASTS_TOTAL, DEFAULT_PORT, MAX_DATAGRAM};

/// Sends datagrams to the local broadcast address.
///
/// Every call to [`broadcast`](Broadcaster::broadcast) opens a short-lived
/// socket with `SO_BROADCAST` set, so a `Broadcaster` holds no OS resources
/// and can be shared freely.
///
/// ```rust,ignore
/// use smrt_broadcast::Broadcaster;
///
/// Broadcaster::new().broadcast("lamp-service up").await?;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Broadcaster {
    target: SocketAddr,
}

impl Broadcaster {
    /// Broadcasts on the default port.
    pub fn new() -> Self {
        Self::with_port(DEFAULT_PORT)
    }

    /// Broadcasts to `255.255.255.255:port`.
    pub fn with_port(port: u16) -> Self {
        Self::with_target(SocketAddr::from((Ipv4Addr::BROADCAST, port)))
    }

    /// Sends to an explicit address instead of the broadcast address.
    pub fn with_target(target: SocketAddr) -> Self {
        Self { target }
    }

    /// Destination of every datagram.
    pub fn target(&self) -> SocketAddr {
        self.target
    }

    /// Sends `message` as a single datagram.
    pub async fn broadcast(&self, message: impl AsRef<str>) -> BroadcastResult<()> {
        let message = message.as_ref();
        if message.len() > MAX_DATAGRAM {
            return Err(BroadcastError::MessageTooLarge {
                size: message.len(),
                max: MAX_DATAGRAM,
            });
        }

        let local = if self.target.is_ipv4() {
            SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0))
        } else {
            SocketAddr::from((Ipv6Addr::UNSPECIFIED, 0))
        };
        let socket = UdpSocket::bind(local)
            .await
            .map_err(|source| BroadcastError::Bind {
                addr: local,
                source,
            })?;
        socket.set_broadcast(true)?;

        debug!(port = self.target.port(), message, "broadcasting");

        socket
            .send_to(message.as_bytes(), self.target)
            .await
            .map_err(|source| BroadcastError::Send {
                target: self.target,
                source,
            })?;

        counter!(BROADCASTS_TOTAL).increment(1);
        Ok(())
    }
}

impl Default for Broadcaster {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_target() {
        let broadcaster = Broadcaster::new();
        assert_eq!(
            broadcaster.target(),
            "255.255.255.255:28015".parse::<SocketAddr>().unwrap()
        );
        assert_eq!(Broadcaster::with_port(9999).target().port(), 9999);
    }

    #[tokio::test]
    async fn test_oversized_message_is_rejected() {
        let broadcaster = Broadcaster::with_target("127.0.0.1:9".parse().unwrap());
        let message = "x".repeat(MAX_DATAGRAM + 1);

        let err = broadcaster.broadcast(message).await.unwrap_err();
        assert!(matches!(
            err,
            BroadcastError::MessageTooLarge { size: 1025, max: 1024 }
        ));
    }
}
