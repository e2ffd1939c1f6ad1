//! Echo service over TCP.

use std::{net::SocketAddr, sync::Arc};

use async_trait::async_trait;
use log::info;
use tokio_util::task::TaskTracker;

use super::{Service, echo_handler};
use crate::{
    buffer::BufferPool,
    config::ServerConfig,
    server::{ServerError, TcpConnector, TcpListener},
    session::SessionRegistry,
};

/// Serves the echo protocol on `server.addr`.
///
/// Stopping closes the listener and asks every live session to quit; the
/// tracked stop work finishes once the accept loop and all connections have
/// ended.
pub struct TcpService {
    config: ServerConfig,
    listener: TcpListener,
    registry: Arc<SessionRegistry>,
    pool: Option<BufferPool>,
    local_addr: Option<SocketAddr>,
}

impl TcpService {
    /// Create the service; nothing is bound until it starts.
    #[must_use]
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            listener: TcpListener::new(),
            registry: Arc::new(SessionRegistry::new()),
            pool: None,
            local_addr: None,
        }
    }

    /// Address bound by [`Service::start`].
    #[must_use]
    pub fn local_addr(&self) -> Option<SocketAddr> { self.local_addr }

    /// Sessions currently served.
    #[must_use]
    pub fn registry(&self) -> &Arc<SessionRegistry> { &self.registry }
}

#[async_trait]
impl Service for TcpService {
    fn name(&self) -> &str { "tcp" }

    async fn init(&mut self) -> Result<(), ServerError> {
        let pool = self.config.pool;
        self.pool = Some(BufferPool::new(pool.init_size, pool.max_size));
        Ok(())
    }

    async fn start(&mut self) -> Result<(), ServerError> {
        let pool = self.pool.get_or_insert_with(|| {
            BufferPool::new(self.config.pool.init_size, self.config.pool.max_size)
        });
        let connector = TcpConnector::new(echo_handler(pool.clone()))
            .with_config(self.config.connector_config())
            .with_registry(Arc::clone(&self.registry));
        let addr = self
            .listener
            .listen_and_serve(&self.config.addr, Arc::new(connector), true)
            .await?;
        info!("tcp service listening: addr={addr}");
        self.local_addr = Some(addr);
        Ok(())
    }

    fn stop(&mut self, tracker: &TaskTracker) {
        self.listener.stop();
        let quit = self.registry.quit_all();
        info!("tcp service stopping: sessions={quit}");
        let listener = self.listener.clone();
        tracker.spawn(async move { listener.wait().await });
    }
}
