//! Length-prefixed framing over byte streams and datagrams.
//!
//! A frame on a stream is `[prefix][payload]` where the prefix is
//! [`LengthFormat::bytes`] wide and carries the total frame length, prefix
//! included. [`FrameReader`] turns an [`AsyncRead`](tokio::io::AsyncRead)
//! into frames; [`DatagramReader`] treats each UDP datagram as one frame.

use std::time::Duration;

use async_trait::async_trait;

pub mod conversion;
mod datagram;
mod error;
pub mod format;
mod handler;
mod reader;

pub use conversion::{bytes_to_u64, u64_to_bytes};
pub use datagram::{DEFAULT_DATAGRAM_SIZE, DatagramReader};
pub use error::FrameError;
pub use format::{Endianness, LengthFormat};
pub use handler::{DiscardFrames, FrameHandler};
pub use reader::{DEFAULT_READ_BUFFER, FrameReader};

use crate::hooks::{DecryptFn, DecryptSlot};

/// Source of inbound frames driven by a session's read loop.
#[async_trait]
pub trait FrameSource: Send {
    /// Read one frame and deliver it to the handler.
    ///
    /// Returns the number of bytes the frame occupied on the wire.
    ///
    /// # Errors
    /// Returns [`FrameError`] if the connection fails, the deadline elapses
    /// or the frame header is malformed.
    async fn read(&mut self) -> Result<usize, FrameError>;

    /// Install or clear the decrypt transform.
    ///
    /// # Errors
    /// Returns [`FrameError::DecryptUnsupported`] when the source cannot
    /// decrypt.
    fn set_decrypt(&self, decrypt: Option<DecryptFn>) -> Result<(), FrameError>;

    /// Bound each subsequent [`FrameSource::read`] by `timeout`.
    fn set_timeout(&mut self, timeout: Option<Duration>);

    /// Shared decrypt slot, if the source supports decryption.
    fn decrypt_slot(&self) -> Option<DecryptSlot>;
}

#[cfg(test)]
mod tests;
