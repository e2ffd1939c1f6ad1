//! Named, typed application messages carried inside frames.
//!
//! A message frame is `[total][name length][name][body]` where both length
//! fields use the codec's [`LengthFormat`](crate::frame::LengthFormat) and
//! `total` covers the whole frame. Bodies are serialized with bincode's
//! standard configuration. Receivers resolve the name through a
//! [`TypeRegistry`] built once at startup.

use std::{any::Any, fmt};

use bincode::{
    Decode,
    Encode,
    config,
    decode_from_slice,
    encode_to_vec,
    error::{DecodeError, EncodeError},
};

mod codec;
mod error;
mod handler;
mod registry;

pub use codec::MessageCodec;
pub use error::MessageError;
pub use handler::MessageHandler;
pub use registry::{TypeRegistry, TypeRegistryBuilder};

/// Application message with a wire name.
///
/// ```
/// use bincode::{Decode, Encode};
/// use wiresession::message::Message;
///
/// #[derive(Debug, PartialEq, Encode, Decode)]
/// struct Ping;
///
/// impl Message for Ping {
///     const NAME: &'static str = "Ping";
/// }
/// ```
pub trait Message: Encode + Decode<()> + Send + 'static {
    /// Name written to the wire and used for registry lookup.
    const NAME: &'static str;

    /// Serialize the message body.
    ///
    /// # Errors
    ///
    /// Returns an [`EncodeError`] if serialization fails.
    fn to_bytes(&self) -> Result<Vec<u8>, EncodeError> { encode_to_vec(self, config::standard()) }

    /// Deserialize a message body.
    ///
    /// # Errors
    ///
    /// Returns a [`DecodeError`] if deserialization fails.
    fn from_bytes(bytes: &[u8]) -> Result<Self, DecodeError>
    where
        Self: Sized,
    {
        decode_from_slice(bytes, config::standard()).map(|(msg, _)| msg)
    }
}

/// A message decoded through the registry.
pub struct DecodedMessage {
    name: &'static str,
    value: Box<dyn Any + Send>,
}

impl DecodedMessage {
    pub(crate) fn new(name: &'static str, value: Box<dyn Any + Send>) -> Self { Self { name, value } }

    /// Registered name of the message.
    #[must_use]
    pub fn name(&self) -> &'static str { self.name }

    /// Returns `true` if the message is an `M`.
    #[must_use]
    pub fn is<M: Message>(&self) -> bool { self.value.is::<M>() }

    /// Borrow the message as an `M`.
    #[must_use]
    pub fn downcast_ref<M: Message>(&self) -> Option<&M> { self.value.downcast_ref() }

    /// Take the message as an `M`, handing `self` back on a type mismatch.
    ///
    /// # Errors
    ///
    /// Returns `self` unchanged when the message is not an `M`.
    pub fn downcast<M: Message>(self) -> Result<M, Self> {
        let Self { name, value } = self;
        value
            .downcast::<M>()
            .map(|msg| *msg)
            .map_err(|value| Self { name, value })
    }
}

impl fmt::Debug for DecodedMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodedMessage")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
