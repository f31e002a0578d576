//! Per-application helpers.

use std::net::SocketAddr;
use std::sync::OnceLock;

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use smrt_broadcast::{BroadcastError, BroadcastResult, Broadcaster, Listener, DEFAULT_PORT};
use smrt_config::{AppConfigLoader, BroadcastSettings, ConfigError};
use tracing::info;

/// What an application gets from the framework besides its routes: its own
/// configuration file and the local network broadcast.
///
/// The broadcaster and the listener are created on first use.
///
/// ```rust,ignore
/// let ctx = AppContext::load(&loader, Some("se.novafaen.lamp.config.v1.json"), &settings.broadcast)?;
/// ctx.listen(|bytes| tracing::info!(len = bytes.len(), "peer announced"))?;
/// ctx.broadcast("lamp-service up").await?;
/// ```
#[derive(Debug)]
pub struct AppContext {
    config: Option<Value>,
    broadcast_port: u16,
    broadcaster: OnceLock<Broadcaster>,
    listener: Mutex<Option<Listener>>,
}

impl AppContext {
    /// Wraps an already loaded configuration.
    pub fn new(config: Option<Value>) -> Self {
        Self {
            config,
            broadcast_port: DEFAULT_PORT,
            broadcaster: OnceLock::new(),
            listener: Mutex::new(None),
        }
    }

    /// Loads the application configuration, validating it against `schema`.
    pub fn load(
        loader: &AppConfigLoader,
        schema: Option<&str>,
        broadcast: &BroadcastSettings,
    ) -> Result<Self, ConfigError> {
        let config = loader.load(schema)?;
        if config.is_some() {
            info!("application configuration read and verified");
        }
        Ok(Self::new(config).with_broadcast_port(broadcast.port))
    }

    /// Uses `port` for both broadcasting and listening.
    pub fn with_broadcast_port(mut self, port: u16) -> Self {
        self.broadcast_port = port;
        self
    }

    /// The application configuration, if a file was found.
    pub fn config(&self) -> Option<&Value> {
        self.config.as_ref()
    }

    /// Deserialises the configuration into `T`.
    pub fn config_as<T: DeserializeOwned>(&self) -> Result<Option<T>, serde_json::Error> {
        self.config
            .as_ref()
            .map(|value| T::deserialize(value))
            .transpose()
    }

    /// Port used for broadcast and listen.
    pub fn broadcast_port(&self) -> u16 {
        self.broadcast_port
    }

    /// Broadcasts `message` to the local network.
    pub async fn broadcast(&self, message: impl AsRef<str>) -> BroadcastResult<()> {
        let port = self.broadcast_port;
        self.broadcaster
            .get_or_init(|| Broadcaster::with_port(port))
            .broadcast(message)
            .await
    }

    /// Starts listening for broadcasts. Only one listener runs at a time.
    ///
    /// The callback runs on the listener's own thread.
    pub fn listen<F>(&self, callback: F) -> BroadcastResult<SocketAddr>
    where
        F: Fn(&[u8]) + Send + Sync + 'static,
    {
        let mut slot = self.listener.lock();
        if slot.as_ref().is_some_and(Listener::is_running) {
            return Err(BroadcastError::AlreadyRunning);
        }

        let listener = Listener::with_port(self.broadcast_port, callback);
        let addr = listener.start()?;
        *slot = Some(listener);
        Ok(addr)
    }

    /// Whether a listener is running.
    pub fn is_listening(&self) -> bool {
        self.listener
            .lock()
            .as_ref()
            .is_some_and(Listener::is_running)
    }

    /// Stops the listener, if any.
    pub async fn stop_listening(&self) {
        let listener = self.listener.lock().take();
        if let Some(listener) = listener {
            listener.stop().await;
        }
    }
}

impl Default for AppContext {
    fn default() -> Self {
        Self::new(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::sync::Arc;

    #[derive(Debug, Deserialize, PartialEq)]
    struct LampConfig {
        bridge: String,
    }

    fn free_udp_port() -> u16 {
        std::net::UdpSocket::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port()
    }

    #[test]
    fn test_config_as() {
        let ctx = AppContext::new(Some(serde_json::json!({"bridge": "10.0.0.2"})));
        let config: Option<LampConfig> = ctx.config_as().unwrap();
        assert_eq!(
            config,
            Some(LampConfig {
                bridge: "10.0.0.2".to_string()
            })
        );

        let empty = AppContext::default();
        assert!(empty.config_as::<LampConfig>().unwrap().is_none());
        assert_eq!(empty.broadcast_port(), 28015);
    }

    #[test]
    fn test_load_without_file() {
        let resolver = Arc::new(smrt_schema::SchemaResolver::new());
        let loader = AppConfigLoader::with_path(None, resolver);
        let settings = BroadcastSettings { port: 39001 };

        let ctx = AppContext::load(&loader, None, &settings).unwrap();
        assert!(ctx.config().is_none());
        assert_eq!(ctx.broadcast_port(), 39001);
    }

    #[test]
    fn test_load_with_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("configuration.json");
        std::fs::write(&path, r#"{"bridge": "10.0.0.2"}"#).unwrap();

        let resolver = Arc::new(smrt_schema::SchemaResolver::with_root(dir.path()));
        let loader = AppConfigLoader::with_path(Some(path), resolver);

        let ctx = AppContext::load(&loader, None, &BroadcastSettings::default()).unwrap();
        assert_eq!(ctx.config().unwrap()["bridge"], "10.0.0.2");
    }

    #[tokio::test]
    async fn test_listen_receives_and_stops() {
        let port = free_udp_port();
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<Vec<u8>>();
        let ctx = AppContext::new(None).with_broadcast_port(port);

        ctx.listen(move |bytes| {
            let _ = tx.send(bytes.to_vec());
        })
        .unwrap();
        assert!(ctx.is_listening());
        assert!(matches!(
            ctx.listen(|_| {}),
            Err(BroadcastError::AlreadyRunning)
        ));

        Broadcaster::with_target(SocketAddr::from(([127, 0, 0, 1], port)))
            .broadcast("hall-service up")
            .await
            .unwrap();
        let message = tokio::time::timeout(std::time::Duration::from_secs(5), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(message, b"hall-service up");

        ctx.stop_listening().await;
        assert!(!ctx.is_listening());
    }
}
