//! Accept loop shared by TCP listeners.

use std::{io, net::SocketAddr, sync::Arc};

use async_trait::async_trait;
use log::warn;
use tokio::{
    net::{TcpListener, TcpStream},
    select,
    time::sleep,
};
use tokio_util::{sync::CancellationToken, task::TaskTracker};

use super::backoff::BackoffConfig;
use crate::server::{Connector, connection::spawn_connection_task};

/// Source of incoming connections consumed by the accept loop.
///
/// Implementations must be cancellation-safe: dropping a pending `accept()`
/// future must not leak resources.
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub(in crate::server) trait AcceptListener: Send + Sync {
    async fn accept(&self) -> io::Result<(TcpStream, SocketAddr)>;
    fn local_addr(&self) -> io::Result<SocketAddr>;
}

#[async_trait]
impl AcceptListener for TcpListener {
    async fn accept(&self) -> io::Result<(TcpStream, SocketAddr)> {
        TcpListener::accept(self).await
    }

    fn local_addr(&self) -> io::Result<SocketAddr> { TcpListener::local_addr(self) }
}

/// Accept connections until `shutdown` is cancelled.
///
/// Each accepted stream is handed to `connector` on its own task tracked by
/// `tracker`. Accept failures are logged and retried forever after an
/// exponential back-off.
pub(in crate::server) async fn accept_loop<L, C>(
    listener: Arc<L>,
    connector: Arc<C>,
    shutdown: CancellationToken,
    tracker: TaskTracker,
    backoff: BackoffConfig,
) where
    L: AcceptListener + 'static,
    C: Connector + ?Sized,
{
    let backoff = backoff.normalized();
    let mut delay = backoff.initial_delay;
    loop {
        let next = select! {
            biased;

            () = shutdown.cancelled() => None,
            res = listener.accept() => Some(match res {
                Ok((stream, peer)) => {
                    spawn_connection_task(stream, peer, Arc::clone(&connector), &tracker);
                    backoff.initial_delay
                }
                Err(e) => {
                    let local_addr = listener.local_addr().ok();
                    warn!("accept error: error={e:?}, local_addr={local_addr:?}");
                    crate::metrics::inc_errors();
                    select! {
                        () = shutdown.cancelled() => return,
                        () = sleep(delay) => {}
                    }
                    backoff.next(delay)
                }
            }),
        };
        match next {
            Some(d) => delay = d,
            None => break,
        }
    }
}
