use thiserror::Error;

/// Errors returned by [`SessionHandle`](super::SessionHandle) operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    /// The session is closing or closed.
    #[error("session closed")]
    Closed,
    /// The outbound queue is full.
    #[error("outbound queue full")]
    QueueFull,
    /// The session's frame source cannot decrypt.
    #[error("session does not support decrypt hooks")]
    DecryptUnsupported,
}
