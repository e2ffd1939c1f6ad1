//! Datagram reader treating each UDP packet as one frame.

use std::{io, net::SocketAddr, sync::Arc, time::Duration};

use async_trait::async_trait;
use tokio::{net::UdpSocket, time::timeout};

use super::{FrameError, FrameHandler, FrameSource};
use crate::{
    hooks::{DecryptFn, DecryptSlot},
    metrics::{self, Direction},
};

/// Size of the buffer each datagram is received into.
pub const DEFAULT_DATAGRAM_SIZE: usize = 8192;

/// Reads whole datagrams from a UDP socket.
///
/// No length prefix is parsed: every datagram is delivered to the handler as
/// one frame. Datagrams larger than the receive buffer are truncated by the
/// operating system. Decrypt transforms are rejected.
pub struct DatagramReader<H> {
    socket: Arc<UdpSocket>,
    handler: H,
    buf: Vec<u8>,
    timeout: Option<Duration>,
    last_peer: Option<SocketAddr>,
}

impl<H: FrameHandler> DatagramReader<H> {
    /// Create a reader with a [`DEFAULT_DATAGRAM_SIZE`] receive buffer.
    pub fn new(socket: Arc<UdpSocket>, handler: H) -> Self {
        Self::with_capacity(socket, handler, DEFAULT_DATAGRAM_SIZE)
    }

    /// Create a reader with a receive buffer of `capacity` bytes.
    pub fn with_capacity(socket: Arc<UdpSocket>, handler: H, capacity: usize) -> Self {
        Self {
            socket,
            handler,
            buf: vec![0; capacity.max(1)],
            timeout: None,
            last_peer: None,
        }
    }

    /// Address of the peer that sent the most recent datagram.
    #[must_use]
    pub fn last_peer(&self) -> Option<SocketAddr> { self.last_peer }

    /// Borrow the socket.
    #[must_use]
    pub fn socket(&self) -> &Arc<UdpSocket> { &self.socket }

    async fn recv(&mut self) -> io::Result<usize> {
        let (n, peer) = self.socket.recv_from(&mut self.buf).await?;
        self.last_peer = Some(peer);
        if n > 0 {
            self.handler.on_frame(&self.buf[..n]);
            metrics::inc_frames(Direction::Inbound);
        }
        Ok(n)
    }
}

#[async_trait]
impl<H: FrameHandler> FrameSource for DatagramReader<H> {
    async fn read(&mut self) -> Result<usize, FrameError> {
        let n = match self.timeout {
            Some(limit) => timeout(limit, self.recv()).await.map_err(|_| {
                io::Error::new(io::ErrorKind::TimedOut, "datagram read deadline elapsed")
            })??,
            None => self.recv().await?,
        };
        Ok(n)
    }

    fn set_decrypt(&self, _decrypt: Option<DecryptFn>) -> Result<(), FrameError> {
        Err(FrameError::DecryptUnsupported)
    }

    fn set_timeout(&mut self, timeout: Option<Duration>) { self.timeout = timeout; }

    fn decrypt_slot(&self) -> Option<DecryptSlot> { None }
}
