//! Stock connector running a read/write session per TCP connection.

use std::{
    net::SocketAddr,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use log::{debug, info};
use tokio::net::TcpStream;

use super::Connector;
use crate::{
    frame::{DiscardFrames, FrameHandler, FrameReader, FrameSource, LengthFormat},
    session::{ReadWriteSession, SessionHandle, SessionHooks, SessionId, SessionRegistry},
};

/// Inbound frame cap applied unless configured otherwise.
pub const DEFAULT_MAX_FRAME_LENGTH: usize = 1024 * 1024;

/// Per-connection settings applied by [`TcpConnector`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConnectorConfig {
    /// Prefix format of inbound frames.
    pub format: LengthFormat,
    /// Outbound queue length; zero selects the session default.
    pub queue_size: usize,
    /// Deadline for each inbound frame. `None` waits forever.
    pub read_timeout: Option<Duration>,
    /// Cap on inbound frame length below what the prefix can declare.
    ///
    /// `None` accepts anything the prefix can declare, which for four or
    /// eight byte prefixes lets one peer force a multi-gigabyte allocation.
    pub max_frame_length: Option<usize>,
    /// Disable Nagle's algorithm on accepted sockets.
    pub nodelay: bool,
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self {
            format: LengthFormat::default(),
            queue_size: 0,
            read_timeout: None,
            max_frame_length: Some(DEFAULT_MAX_FRAME_LENGTH),
            nodelay: true,
        }
    }
}

/// Connector that runs a [`ReadWriteSession`] over each accepted stream.
///
/// `make_handler` builds the frame handler for a new session from the
/// session's own handle, so handlers can answer on the same connection.
/// Session ids are assigned in accept order starting at 1.
pub struct TcpConnector<F> {
    config: ConnectorConfig,
    make_handler: F,
    registry: Option<Arc<SessionRegistry>>,
    next_id: AtomicU64,
}

impl TcpConnector<fn(SessionHandle) -> DiscardFrames> {
    /// Connector whose sessions ignore every inbound frame.
    #[must_use]
    pub fn discarding() -> Self { Self::new(|_| DiscardFrames) }
}

impl<F, H> TcpConnector<F>
where
    F: Fn(SessionHandle) -> H + Send + Sync + 'static,
    H: FrameHandler + 'static,
{
    /// Create a connector with the default [`ConnectorConfig`].
    pub fn new(make_handler: F) -> Self {
        Self {
            config: ConnectorConfig::default(),
            make_handler,
            registry: None,
            next_id: AtomicU64::new(1),
        }
    }

    /// Replace the per-connection settings.
    #[must_use]
    pub fn with_config(mut self, config: ConnectorConfig) -> Self {
        self.config = config;
        self
    }

    /// Track every live session in `registry`.
    #[must_use]
    pub fn with_registry(mut self, registry: Arc<SessionRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Per-connection settings in use.
    #[must_use]
    pub fn config(&self) -> &ConnectorConfig { &self.config }

    fn hooks(&self) -> SessionHooks {
        let Some(registry) = &self.registry else {
            return SessionHooks::new();
        };
        let on_new = Arc::clone(registry);
        let on_quit = Arc::clone(registry);
        SessionHooks::new()
            .on_new_session(move |h| on_new.insert(h))
            .on_quit_session(move |h| on_quit.remove(&h.id()))
    }
}

#[async_trait]
impl<F, H> Connector for TcpConnector<F>
where
    F: Fn(SessionHandle) -> H + Send + Sync + 'static,
    H: FrameHandler + 'static,
{
    async fn on_connect(&self, stream: TcpStream, peer: SocketAddr) {
        let config = self.config;
        if config.nodelay {
            if let Err(e) = stream.set_nodelay(true) {
                debug!("set_nodelay failed: peer={peer}, error={e}");
            }
        }
        let (read, write) = stream.into_split();
        let id = SessionId::new(self.next_id.fetch_add(1, Ordering::Relaxed));

        let session = ReadWriteSession::with_source(id, write, config.queue_size, |handle| {
            let mut reader =
                FrameReader::new(read, (self.make_handler)(handle)).with_format(config.format);
            if let Some(max) = config.max_frame_length {
                reader.set_max_frame_length(max);
            }
            reader.set_timeout(config.read_timeout);
            reader
        });

        info!("connection accepted: peer={peer}, session={id}");
        session.run(self.hooks()).await;
        info!("connection closed: peer={peer}, session={id}");
    }
}
