//! Stream reader splitting a byte stream into length-prefixed frames.

use std::{io, time::Duration};

use async_trait::async_trait;
use tokio::{
    io::{AsyncRead, AsyncReadExt},
    time::timeout,
};

use super::{FrameError, FrameHandler, FrameSource, LengthFormat};
use crate::{
    hooks::{DecryptFn, DecryptSlot},
    metrics::{self, Direction},
};

/// Initial capacity of the scratch buffer frames are assembled in.
pub const DEFAULT_READ_BUFFER: usize = 4096;

/// Reads length-prefixed frames from `R` and hands each to `H`.
///
/// Reading a frame consumes exactly the prefix, decrypts it in place when a
/// transform is installed, then accumulates partial reads until the declared
/// length is available. The body is decrypted separately from the prefix
/// before the whole frame reaches the handler.
///
/// # Examples
///
/// ```
/// use wiresession::frame::{FrameReader, FrameSource};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), wiresession::frame::FrameError> {
/// let wire: &[u8] = &[5, 0, b'p', b'i', b'n'];
/// let mut frames = Vec::new();
/// let mut reader = FrameReader::new(wire, |frame: &[u8]| frames.push(frame.to_vec()));
/// assert_eq!(reader.read().await?, 5);
/// drop(reader);
/// assert_eq!(frames, vec![vec![5, 0, b'p', b'i', b'n']]);
/// # Ok(())
/// # }
/// ```
pub struct FrameReader<R, H> {
    conn: R,
    handler: H,
    format: LengthFormat,
    buf: Vec<u8>,
    timeout: Option<Duration>,
    max_frame_length: usize,
    decrypt: DecryptSlot,
}

impl<R, H> FrameReader<R, H>
where
    R: AsyncRead + Unpin + Send,
    H: FrameHandler,
{
    /// Create a reader using the default two-byte little-endian prefix.
    pub fn new(conn: R, handler: H) -> Self {
        let format = LengthFormat::default();
        Self {
            conn,
            handler,
            format,
            buf: vec![0; DEFAULT_READ_BUFFER],
            timeout: None,
            max_frame_length: format.max_frame_len(),
            decrypt: DecryptSlot::new(),
        }
    }

    /// Replace the prefix format, resetting the frame cap to the widest
    /// length the new prefix can declare.
    #[must_use]
    pub fn with_format(mut self, format: LengthFormat) -> Self {
        self.set_format(format);
        self
    }

    /// Replace the prefix format in place.
    pub fn set_format(&mut self, format: LengthFormat) {
        self.format = format;
        self.max_frame_length = format.max_frame_len();
        if self.buf.len() < format.bytes {
            self.buf.resize(format.bytes, 0);
        }
    }

    /// Reject frames whose declared length exceeds `max` before allocating.
    ///
    /// Without a cap the reader grows its buffer to whatever the prefix
    /// declares, up to `u32::MAX` bytes and beyond for wide prefixes.
    pub fn set_max_frame_length(&mut self, max: usize) {
        self.max_frame_length = max.min(self.format.max_frame_len());
    }

    /// Current prefix format.
    #[must_use]
    pub fn format(&self) -> LengthFormat { self.format }

    /// Borrow the underlying connection.
    pub fn get_ref(&self) -> &R { &self.conn }

    /// Borrow the frame handler.
    pub fn handler_mut(&mut self) -> &mut H { &mut self.handler }

    /// Consume the reader, returning the connection and handler.
    pub fn into_parts(self) -> (R, H) { (self.conn, self.handler) }

    async fn read_frame(&mut self) -> Result<usize, FrameError> {
        let width = self.format.bytes;
        self.conn.read_exact(&mut self.buf[..width]).await?;

        // One snapshot per frame: a swap lands on the next frame boundary.
        let decrypt: Option<DecryptFn> = self.decrypt.current();
        if let Some(decrypt) = &decrypt {
            decrypt(&mut self.buf[..width]);
        }

        let len = self.format.read_len(&self.buf[..width])?;
        if len < width {
            return Err(FrameError::FrameTooShort { len, prefix: width });
        }
        if len > self.max_frame_length {
            return Err(FrameError::FrameTooLarge {
                len,
                max: self.max_frame_length,
            });
        }
        if self.buf.len() < len {
            self.buf.resize(len, 0);
        }

        let mut filled = width;
        while filled < len {
            let n = self.conn.read(&mut self.buf[filled..len]).await?;
            if n == 0 {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "connection closed mid-frame",
                )
                .into());
            }
            filled += n;
        }

        if let Some(decrypt) = &decrypt {
            decrypt(&mut self.buf[width..len]);
        }
        self.handler.on_frame(&self.buf[..len]);
        metrics::inc_frames(Direction::Inbound);
        Ok(len)
    }
}

#[async_trait]
impl<R, H> FrameSource for FrameReader<R, H>
where
    R: AsyncRead + Unpin + Send,
    H: FrameHandler,
{
    async fn read(&mut self) -> Result<usize, FrameError> {
        match self.timeout {
            Some(limit) => timeout(limit, self.read_frame()).await.map_err(|_| {
                FrameError::Io(io::Error::new(
                    io::ErrorKind::TimedOut,
                    "frame read deadline elapsed",
                ))
            })?,
            None => self.read_frame().await,
        }
    }

    fn set_decrypt(&self, decrypt: Option<DecryptFn>) -> Result<(), FrameError> {
        self.decrypt.set(decrypt);
        Ok(())
    }

    fn set_timeout(&mut self, timeout: Option<Duration>) { self.timeout = timeout; }

    fn decrypt_slot(&self) -> Option<DecryptSlot> { Some(self.decrypt.clone()) }
}
