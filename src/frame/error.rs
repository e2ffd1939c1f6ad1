//! Error types raised while reading frames.

use std::io;

use thiserror::Error;

/// Errors produced by [`FrameSource`](super::FrameSource) implementations.
///
/// Any error aborts the frame being read; no partial-frame recovery is
/// attempted and callers are expected to close the connection.
#[derive(Debug, Error)]
pub enum FrameError {
    /// The underlying connection failed, timed out or closed mid-frame.
    #[error("frame transport error: {0}")]
    Io(#[from] io::Error),
    /// The declared frame length exceeds the configured maximum.
    #[error("frame length {len} exceeds maximum {max}")]
    FrameTooLarge {
        /// Length declared by the prefix.
        len: usize,
        /// Maximum accepted by the reader.
        max: usize,
    },
    /// The declared frame length cannot even hold its own prefix.
    #[error("declared frame length {len} is shorter than the {prefix}-byte prefix")]
    FrameTooShort {
        /// Length declared by the prefix.
        len: usize,
        /// Width of the prefix.
        prefix: usize,
    },
    /// The reader cannot apply a decrypt transform.
    #[error("decrypt hooks are not supported by this reader")]
    DecryptUnsupported,
}

impl FrameError {
    /// Returns `true` if the peer closed the connection.
    #[must_use]
    pub fn is_eof(&self) -> bool {
        matches!(self, Self::Io(e) if e.kind() == io::ErrorKind::UnexpectedEof)
    }
}
