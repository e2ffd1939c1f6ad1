//! Errors raised by listeners and services.

use std::io;

use thiserror::Error;

use crate::config::ConfigError;

/// Errors that may occur while serving connections.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Binding the listening socket failed.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// Address that could not be bound.
        addr: String,
        /// Underlying socket error.
        #[source]
        source: io::Error,
    },
    /// A socket operation other than binding failed.
    #[error("socket error: {0}")]
    Io(#[from] io::Error),
    /// The service configuration is invalid.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    /// A named service failed to initialise or start.
    #[error("service {name} failed: {source}")]
    Service {
        /// Name of the failing service.
        name: String,
        /// Underlying failure.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}
