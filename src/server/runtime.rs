//! TCP listener driving the accept loop.

mod accept;
mod backoff;
#[cfg(test)]
mod tests;

use std::{net::SocketAddr, sync::Arc};

#[cfg(test)]
pub(super) use accept::MockAcceptListener;
use accept::accept_loop;
pub use backoff::BackoffConfig;
use log::info;
use tokio::net::TcpListener as TokioTcpListener;
use tokio_util::{sync::CancellationToken, task::TaskTracker};

use super::{Connector, ServerError};

/// Accepts TCP connections and hands each to a [`Connector`].
///
/// Every accept loop and connection task is tracked, so [`TcpListener::stop`]
/// followed by [`TcpListener::wait`] drains the listener completely.
#[derive(Clone, Debug, Default)]
pub struct TcpListener {
    shutdown: CancellationToken,
    tracker: TaskTracker,
    backoff: BackoffConfig,
}

impl TcpListener {
    /// Create a listener with the default accept back-off.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Override the accept back-off.
    #[must_use]
    pub fn with_backoff(mut self, backoff: BackoffConfig) -> Self {
        self.backoff = backoff.normalized();
        self
    }

    /// Bind `addr` and accept connections until [`TcpListener::stop`] is
    /// called.
    ///
    /// With `background` set the accept loop runs on its own task and this
    /// returns as soon as the socket is bound; otherwise it returns once the
    /// loop has stopped. Either way the bound address is returned, which is
    /// useful when binding port `0`.
    ///
    /// ```no_run
    /// use std::sync::Arc;
    ///
    /// use wiresession::server::{TcpConnector, TcpListener};
    ///
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), wiresession::server::ServerError> {
    /// let listener = TcpListener::new();
    /// let connector = Arc::new(TcpConnector::discarding());
    /// let addr = listener
    ///     .listen_and_serve("127.0.0.1:0", connector, true)
    ///     .await?;
    /// println!("listening on {addr}");
    /// listener.stop();
    /// listener.wait().await;
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Bind`] if the address cannot be bound. Accept
    /// failures are retried with exponential back-off and never surface.
    pub async fn listen_and_serve<C>(
        &self,
        addr: &str,
        connector: Arc<C>,
        background: bool,
    ) -> Result<SocketAddr, ServerError>
    where
        C: Connector + ?Sized,
    {
        let listener = TokioTcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: addr.to_owned(),
                source,
            })?;
        let local = listener.local_addr()?;
        info!("tcp listener bound: addr={local}");

        let serve = accept_loop(
            Arc::new(listener),
            connector,
            self.shutdown.clone(),
            self.tracker.clone(),
            self.backoff,
        );
        if background {
            self.tracker.spawn(serve);
        } else {
            serve.await;
        }
        Ok(local)
    }

    /// Stop accepting new connections.
    pub fn stop(&self) { self.shutdown.cancel(); }

    /// Wait for accept loops and connection tasks to finish.
    pub async fn wait(&self) {
        self.tracker.close();
        self.tracker.wait().await;
    }

    /// Token cancelled by [`TcpListener::stop`].
    #[must_use]
    pub fn shutdown_token(&self) -> &CancellationToken { &self.shutdown }

    /// Tracker owning the accept loops and connection tasks.
    #[must_use]
    pub fn tracker(&self) -> &TaskTracker { &self.tracker }
}
