//! UDP listener delivering each datagram to a frame handler.

use std::{net::SocketAddr, sync::Arc};

use log::{info, warn};
use tokio::net::UdpSocket;
use tokio_util::{sync::CancellationToken, task::TaskTracker};

use super::ServerError;
use crate::{
    frame::{DEFAULT_DATAGRAM_SIZE, DatagramReader, FrameHandler, FrameSource},
    metrics,
};

/// Receives datagrams on one socket until stopped.
///
/// Receive errors are logged and the loop carries on; only
/// [`UdpListener::stop`] ends it.
#[derive(Clone, Debug)]
pub struct UdpListener {
    shutdown: CancellationToken,
    tracker: TaskTracker,
    datagram_size: usize,
}

impl Default for UdpListener {
    fn default() -> Self {
        Self {
            shutdown: CancellationToken::new(),
            tracker: TaskTracker::new(),
            datagram_size: DEFAULT_DATAGRAM_SIZE,
        }
    }
}

impl UdpListener {
    /// Create a listener with a [`DEFAULT_DATAGRAM_SIZE`] receive buffer.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Receive datagrams into a buffer of `size` bytes.
    #[must_use]
    pub fn with_datagram_size(mut self, size: usize) -> Self {
        self.datagram_size = size;
        self
    }

    /// Bind `addr` and hand every datagram to the handler built by
    /// `make_handler`.
    ///
    /// The handler receives the socket so it can reply to the sender. With
    /// `background` set the receive loop runs on its own task and this
    /// returns once bound.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Bind`] if the address cannot be bound.
    pub async fn listen_and_serve<F, H>(
        &self,
        addr: &str,
        make_handler: F,
        background: bool,
    ) -> Result<SocketAddr, ServerError>
    where
        F: FnOnce(Arc<UdpSocket>) -> H,
        H: FrameHandler + 'static,
    {
        let socket = UdpSocket::bind(addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: addr.to_owned(),
                source,
            })?;
        let socket = Arc::new(socket);
        let local = socket.local_addr()?;
        info!("udp listener bound: addr={local}");

        let handler = make_handler(Arc::clone(&socket));
        let reader = DatagramReader::with_capacity(socket, handler, self.datagram_size);
        let serve = receive_loop(reader, self.shutdown.clone());
        if background {
            self.tracker.spawn(serve);
        } else {
            serve.await;
        }
        Ok(local)
    }

    /// Stop receiving.
    pub fn stop(&self) { self.shutdown.cancel(); }

    /// Wait for background receive loops to finish.
    pub async fn wait(&self) {
        self.tracker.close();
        self.tracker.wait().await;
    }
}

async fn receive_loop<H: FrameHandler>(mut reader: DatagramReader<H>, shutdown: CancellationToken) {
    loop {
        let result = tokio::select! {
            biased;
            () = shutdown.cancelled() => break,
            result = reader.read() => result,
        };
        if let Err(e) = result {
            warn!("udp receive failed: error={e}");
            metrics::inc_errors();
        }
    }
    info!("udp listener stopped");
}
