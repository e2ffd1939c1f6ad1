//! Encoding and decoding of named message frames.

use std::sync::Arc;

use bytes::BytesMut;

use super::{DecodedMessage, Message, MessageError, TypeRegistry};
use crate::{buffer::Buffer, frame::LengthFormat};

/// Encodes messages into frames and decodes frames through a registry.
///
/// ```
/// use std::sync::Arc;
///
/// use bincode::{Decode, Encode};
/// use bytes::BytesMut;
/// use wiresession::message::{Message, MessageCodec, TypeRegistry};
///
/// #[derive(Debug, PartialEq, Encode, Decode)]
/// struct Ping;
/// impl Message for Ping {
///     const NAME: &'static str = "Ping";
/// }
///
/// let registry = Arc::new(TypeRegistry::builder().register::<Ping>().build()?);
/// let codec = MessageCodec::new(registry);
/// let mut wire = BytesMut::new();
/// codec.encode(&Ping, &mut wire)?;
/// assert_eq!(&wire[..], b"\x08\x00\x04\x00Ping");
/// let msg = codec.decode(&wire)?;
/// assert_eq!(msg.downcast::<Ping>().ok(), Some(Ping));
/// # Ok::<(), wiresession::message::MessageError>(())
/// ```
#[derive(Clone, Debug)]
pub struct MessageCodec {
    format: LengthFormat,
    registry: Arc<TypeRegistry>,
}

impl MessageCodec {
    /// Create a codec using the default two-byte little-endian prefixes.
    #[must_use]
    pub fn new(registry: Arc<TypeRegistry>) -> Self {
        Self {
            format: LengthFormat::default(),
            registry,
        }
    }

    /// Use `format` for both length fields.
    #[must_use]
    pub fn with_format(mut self, format: LengthFormat) -> Self {
        self.format = format;
        self
    }

    /// Prefix format for both length fields.
    #[must_use]
    pub fn format(&self) -> LengthFormat { self.format }

    /// Registry used to resolve names.
    #[must_use]
    pub fn registry(&self) -> &Arc<TypeRegistry> { &self.registry }

    /// Append `msg` as a complete frame to `dst`.
    ///
    /// Nothing is written if encoding fails.
    ///
    /// # Errors
    ///
    /// Returns [`MessageError::Encode`] if the body cannot be serialized, or
    /// [`MessageError::FrameTooLarge`] if the frame length cannot be
    /// represented by the prefix.
    pub fn encode<M: Message>(&self, msg: &M, dst: &mut BytesMut) -> Result<(), MessageError> {
        let body = msg.to_bytes()?;
        let name = M::NAME.as_bytes();
        let total = self.frame_len(name.len(), body.len())?;

        dst.reserve(total);
        let io_err = |_| MessageError::FrameTooLarge(total);
        self.format.write_len(total, dst).map_err(io_err)?;
        self.format.write_len(name.len(), dst).map_err(io_err)?;
        dst.extend_from_slice(name);
        dst.extend_from_slice(&body);
        Ok(())
    }

    /// Append `msg` as a complete frame to a pool buffer.
    ///
    /// # Errors
    ///
    /// See [`MessageCodec::encode`].
    pub fn encode_into<M: Message>(&self, msg: &M, buf: &Buffer) -> Result<(), MessageError> {
        buf.with_mut(|dst| self.encode(msg, dst))
    }

    /// Decode one message frame.
    ///
    /// `frame` starts at the total-length prefix. Bytes past the declared
    /// total are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`MessageError::TooShort`] at the first header field that does
    /// not fit, [`MessageError::UnknownMessageName`] for unregistered names
    /// and [`MessageError::Decode`] for malformed bodies.
    pub fn decode(&self, frame: &[u8]) -> Result<DecodedMessage, MessageError> {
        let width = self.format.bytes;
        let mut rest = frame;

        let total = self.take_len(&mut rest)?;
        let name_len = self.take_len(&mut rest)?;
        let name = take(&mut rest, name_len)?;
        let header = 2 * width + name_len;

        if total < header {
            return Err(MessageError::LengthMismatch {
                declared: total,
                header,
            });
        }
        let body = take(&mut rest, total - header)?;

        // Non UTF-8 names can never be registered.
        let name = std::str::from_utf8(name)
            .map_err(|_| MessageError::UnknownMessageName(String::from_utf8_lossy(name).into_owned()))?;
        self.registry.decode(name, body)
    }

    fn frame_len(&self, name_len: usize, body_len: usize) -> Result<usize, MessageError> {
        let total = (2 * self.format.bytes)
            .checked_add(name_len)
            .and_then(|n| n.checked_add(body_len))
            .ok_or(MessageError::FrameTooLarge(usize::MAX))?;
        if total > self.format.max_frame_len() {
            return Err(MessageError::FrameTooLarge(total));
        }
        Ok(total)
    }

    fn take_len(&self, rest: &mut &[u8]) -> Result<usize, MessageError> {
        let bytes = take(rest, self.format.bytes)?;
        self.format
            .read_len(bytes)
            .map_err(|_| MessageError::FrameTooLarge(usize::MAX))
    }
}

fn take<'a>(rest: &mut &'a [u8], n: usize) -> Result<&'a [u8], MessageError> {
    if rest.len() < n {
        return Err(MessageError::TooShort {
            needed: n,
            remaining: rest.len(),
        });
    }
    let (head, tail) = rest.split_at(n);
    *rest = tail;
    Ok(head)
}
