//! Service lifecycle orchestration.
//!
//! A process is a set of [`Service`]s. [`run_services`] initialises every
//! service, starts them, waits for a shutdown signal and then stops them,
//! waiting for all stop work tracked on a shared
//! [`TaskTracker`](tokio_util::task::TaskTracker) to finish.

use std::future::Future;

use async_trait::async_trait;
use log::info;
use tokio_util::task::TaskTracker;

use crate::server::ServerError;

mod echo;
mod tcp;

pub use echo::{EchoHandler, echo_handler};
pub use tcp::TcpService;

/// A long-running component of a server process.
#[async_trait]
pub trait Service: Send {
    /// Name used in logs and errors.
    fn name(&self) -> &str;

    /// Prepare resources; nothing is served yet.
    async fn init(&mut self) -> Result<(), ServerError>;

    /// Begin serving without blocking.
    async fn start(&mut self) -> Result<(), ServerError>;

    /// Stop serving. Work that must finish before the process exits is
    /// spawned on `tracker`.
    fn stop(&mut self, tracker: &TaskTracker);
}

/// Run `services` until `shutdown` resolves.
///
/// Every service is initialised, then every service is started, in order.
/// The first failure aborts the run without starting later services; any
/// service already started is stopped before returning.
///
/// # Errors
///
/// Returns [`ServerError::Service`] naming the service that failed.
pub async fn run_services<F>(
    services: &mut [Box<dyn Service>],
    shutdown: F,
) -> Result<(), ServerError>
where
    F: Future<Output = ()>,
{
    info!("run services: count={}", services.len());
    for service in services.iter_mut() {
        service.init().await.map_err(|e| service_error(&**service, e))?;
        info!("service init ok: name={}", service.name());
    }

    let mut started = 0;
    let mut failure = None;
    for service in services.iter_mut() {
        if let Err(e) = service.start().await {
            failure = Some(service_error(&**service, e));
            break;
        }
        info!("service start ok: name={}", service.name());
        started += 1;
    }

    if failure.is_none() {
        shutdown.await;
    }

    let tracker = TaskTracker::new();
    for service in services.iter_mut().take(started) {
        service.stop(&tracker);
        info!("service stop: name={}", service.name());
    }
    tracker.close();
    tracker.wait().await;
    info!("all services exit");

    failure.map_or(Ok(()), Err)
}

fn service_error(service: &dyn Service, source: ServerError) -> ServerError {
    ServerError::Service {
        name: service.name().to_owned(),
        source: Box::new(source),
    }
}

/// Resolve on Ctrl-C, the default shutdown signal for [`run_services`].
pub async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("failed to listen for ctrl-c: error={e}");
    }
}
