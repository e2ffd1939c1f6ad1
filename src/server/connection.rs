//! Per-connection task spawning.

use std::{net::SocketAddr, sync::Arc};

use futures::FutureExt;
use log::error;
use tokio::net::TcpStream;
use tokio_util::task::TaskTracker;

use super::Connector;

/// Spawn a task handing `stream` to `connector`, logging and discarding any
/// panic so one connection cannot take the listener down.
pub(super) fn spawn_connection_task<C>(
    stream: TcpStream,
    peer_addr: SocketAddr,
    connector: Arc<C>,
    tracker: &TaskTracker,
) where
    C: Connector + ?Sized,
{
    tracker.spawn(async move {
        let fut = std::panic::AssertUnwindSafe(connector.on_connect(stream, peer_addr)).catch_unwind();

        if let Err(panic) = fut.await {
            crate::metrics::inc_connection_panics();
            let panic_msg = crate::panic::format_panic(panic);
            // Emit via both `log` and `tracing` for tests that capture either.
            error!("connection task panicked: panic={panic_msg}, peer_addr={peer_addr}");
            tracing::error!(panic = %panic_msg, %peer_addr, "connection task panicked");
        }
    });
}
