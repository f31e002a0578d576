//! Receiving side.
//!
//! The receive loop runs on its own OS thread with a blocking socket, so a
//! slow callback never holds up an async runtime.

use std::io::ErrorKind;
use std::net::{Ipv4Addr, SocketAddr, UdpSocket};
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};

use crate::error::{BroadcastError, BroadcastResult};
use crate::{DEFAULT_PORT, MAX_DATAGRAM};

/// Called with the raw bytes of every received datagram.
pub type Callback = Arc<dyn Fn(&[u8]) + Send + Sync>;

/// How often the receive thread checks for a stop request.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// First pause after a failed receive. Doubles per consecutive failure.
const ERROR_BACKOFF: Duration = Duration::from_millis(50);

/// Longest pause between failed receives.
const MAX_ERROR_BACKOFF: Duration = Duration::from_secs(5);

/// Background receiver for broadcast datagrams.
///
/// [`start`](Listener::start) binds the socket and spawns a receive thread
/// that hands each datagram (up to [`MAX_DATAGRAM`] bytes) to the callback.
/// The thread runs until [`stop`](Listener::stop) is called or the listener
/// is dropped.
pub struct Listener {
    bind_addr: SocketAddr,
    callback: Callback,
    running: AtomicBool,
    active: Mutex<Option<ReceiveThread>>,
    received: Arc<AtomicU64>,
}

/// Handle on a live receive thread.
struct ReceiveThread {
    stop: Arc<AtomicBool>,
    exited: oneshot::Receiver<()>,
}

impl ReceiveThread {
    fn request_stop(&self) {
        self.stop.store(true, Ordering::Release);
    }
}

impl Listener {
    /// Listens on all interfaces at the default port.
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&[u8]) + Send + Sync + 'static,
    {
        Self::with_port(DEFAULT_PORT, callback)
    }

    /// Listens on all interfaces at `port`.
    pub fn with_port<F>(port: u16, callback: F) -> Self
    where
        F: Fn(&[u8]) + Send + Sync + 'static,
    {
        Self::bind(SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)), callback)
    }

    /// Listens on an explicit address. Port 0 picks a free port.
    pub fn bind<F>(addr: SocketAddr, callback: F) -> Self
    where
        F: Fn(&[u8]) + Send + Sync + 'static,
    {
        Self {
            bind_addr: addr,
            callback: Arc::new(callback),
            running: AtomicBool::new(false),
            active: Mutex::new(None),
            received: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Whether the receive thread is running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Datagrams delivered to the callback so far.
    pub fn received(&self) -> u64 {
        self.received.load(Ordering::Relaxed)
    }

    /// Binds the socket and starts the receive thread.
    ///
    /// Returns the bound address.
    ///
    /// # Errors
    ///
    /// [`BroadcastError::AlreadyRunning`] if the listener is running,
    /// [`BroadcastError::Bind`] if the port cannot be bound.
    pub fn start(&self) -> BroadcastResult<SocketAddr> {
        let mut active = self.active.lock();
        if active.is_some() {
            return Err(BroadcastError::AlreadyRunning);
        }

        let socket = self.open()?;
        let local = socket.local_addr()?;

        let stop = Arc::new(AtomicBool::new(false));
        let (exited_tx, exited) = oneshot::channel();
        let receiver = Receiver {
            socket,
            port: local.port(),
            callback: Arc::clone(&self.callback),
            received: Arc::clone(&self.received),
            stop: Arc::clone(&stop),
        };

        thread::Builder::new()
            .name(format!("smrt-listener-{}", local.port()))
            .spawn(move || {
                receiver.run();
                let _ = exited_tx.send(());
            })?;

        *active = Some(ReceiveThread { stop, exited });
        self.running.store(true, Ordering::Release);

        info!(port = local.port(), "listening on broadcast port");
        Ok(local)
    }

    /// Stops the receive thread and waits for it to finish.
    ///
    /// A callback that is mid-call is allowed to return first.
    pub async fn stop(&self) {
        let thread = {
            let mut active = self.active.lock();
            self.running.store(false, Ordering::Release);
            active.take()
        };

        if let Some(thread) = thread {
            thread.request_stop();
            let _ = thread.exited.await;
        }
    }

    fn open(&self) -> BroadcastResult<UdpSocket> {
        let socket = UdpSocket::bind(self.bind_addr).map_err(|source| BroadcastError::Bind {
            addr: self.bind_addr,
            source,
        })?;
        socket.set_broadcast(true)?;
        socket.set_read_timeout(Some(POLL_INTERVAL))?;
        Ok(socket)
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        if let Some(thread) = self.active.get_mut().take() {
            thread.request_stop();
        }
    }
}

impl std::fmt::Debug for Listener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listener")
            .field("bind_addr", &self.bind_addr)
            .field("running", &self.is_running())
            .field("received", &self.received())
            .finish_non_exhaustive()
    }
}

/// State owned by the receive thread.
struct Receiver {
    socket: UdpSocket,
    port: u16,
    callback: Callback,
    received: Arc<AtomicU64>,
    stop: Arc<AtomicBool>,
}

impl Receiver {
    fn run(self) {
        let port = self.port;
        let mut buf = [0u8; MAX_DATAGRAM];
        let mut backoff = ERROR_BACKOFF;

        while !self.stop.load(Ordering::Acquire) {
            let (len, sender) = match self.socket.recv_from(&mut buf) {
                Ok(received) => received,
                Err(e) if is_idle(e.kind()) => continue,
                Err(e) => {
                    warn!(port, error = %e, retry_in = ?backoff, "broadcast receive failed");
                    thread::sleep(backoff);
                    backoff = (backoff * 2).min(MAX_ERROR_BACKOFF);
                    continue;
                }
            };
            backoff = ERROR_BACKOFF;
            debug!(%sender, len, "received broadcast message");

            let data = &buf[..len];
            if std::panic::catch_unwind(AssertUnwindSafe(|| (self.callback)(data))).is_err() {
                error!(%sender, "broadcast callback panicked");
            }
            self.received.fetch_add(1, Ordering::Relaxed);
        }

        info!(port, "stopped listening to broadcast port");
    }
}

/// Read timeouts and interrupts; nothing arrived, nothing failed.
fn is_idle(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::WouldBlock | ErrorKind::TimedOut | ErrorKind::Interrupted
    )
}
