//! TCP and UDP listeners feeding accepted connections into sessions.
//!
//! [`TcpListener`] runs an accept loop and hands every stream to a
//! [`Connector`] on its own task. [`TcpConnector`] is the stock connector:
//! it splits the stream, wraps the read half in a
//! [`FrameReader`](crate::frame::FrameReader) and runs a
//! [`ReadWriteSession`](crate::session::ReadWriteSession) until the peer goes
//! away. [`UdpListener`] drives a
//! [`DatagramReader`](crate::frame::DatagramReader) over a bound socket.

use std::net::SocketAddr;

use async_trait::async_trait;
use tokio::net::TcpStream;

mod connection;
mod connector;
mod error;
mod runtime;
#[cfg(test)]
pub(crate) mod test_util;
mod udp;

pub use connector::{ConnectorConfig, DEFAULT_MAX_FRAME_LENGTH, TcpConnector};
pub use error::ServerError;
pub use runtime::{BackoffConfig, TcpListener};
pub use udp::UdpListener;

/// Receives each connection accepted by a [`TcpListener`].
///
/// `on_connect` runs on a dedicated task and owns the stream for as long as
/// the connection lives. A panic inside it is caught and logged; the
/// listener keeps accepting.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    /// Serve one accepted connection.
    async fn on_connect(&self, stream: TcpStream, peer: SocketAddr);
}
