//! Name to decoder mapping used to resolve inbound messages.

use std::{any::Any, collections::HashMap, fmt};

use bincode::error::DecodeError;

use super::{DecodedMessage, Message, MessageError};

type DecodeFn = fn(&[u8]) -> Result<Box<dyn Any + Send>, DecodeError>;

fn decode_boxed<M: Message>(bytes: &[u8]) -> Result<Box<dyn Any + Send>, DecodeError> {
    M::from_bytes(bytes).map(|msg| Box::new(msg) as Box<dyn Any + Send>)
}

#[derive(Clone, Copy)]
struct Entry {
    name: &'static str,
    decode: DecodeFn,
}

/// Immutable registry of decodable message types.
///
/// Built once through [`TypeRegistry::builder`] and shared behind an
/// [`Arc`](std::sync::Arc); lookups take no locks.
///
/// ```
/// use bincode::{Decode, Encode};
/// use wiresession::message::{Message, TypeRegistry};
///
/// #[derive(Encode, Decode)]
/// struct Ping;
/// impl Message for Ping {
///     const NAME: &'static str = "Ping";
/// }
///
/// let registry = TypeRegistry::builder().register::<Ping>().build()?;
/// assert!(registry.contains("Ping"));
/// # Ok::<(), wiresession::message::MessageError>(())
/// ```
#[derive(Clone, Default)]
pub struct TypeRegistry {
    entries: HashMap<&'static str, Entry>,
}

impl TypeRegistry {
    /// Start registering message types.
    #[must_use]
    pub fn builder() -> TypeRegistryBuilder { TypeRegistryBuilder::default() }

    /// Returns `true` if a type is registered under `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool { self.entries.contains_key(name) }

    /// Number of registered types.
    #[must_use]
    pub fn len(&self) -> usize { self.entries.len() }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    /// Decode `body` as the type registered under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`MessageError::UnknownMessageName`] if `name` is not
    /// registered, or [`MessageError::Decode`] if the body is malformed.
    pub fn decode(&self, name: &str, body: &[u8]) -> Result<DecodedMessage, MessageError> {
        let entry = self
            .entries
            .get(name)
            .ok_or_else(|| MessageError::UnknownMessageName(name.to_owned()))?;
        let value = (entry.decode)(body)?;
        Ok(DecodedMessage::new(entry.name, value))
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.entries.keys()).finish()
    }
}

/// Collects message types before freezing them into a [`TypeRegistry`].
#[derive(Default)]
pub struct TypeRegistryBuilder {
    entries: HashMap<&'static str, Entry>,
    duplicate: Option<&'static str>,
}

impl TypeRegistryBuilder {
    /// Register `M` under [`Message::NAME`].
    #[must_use]
    pub fn register<M: Message>(mut self) -> Self {
        let entry = Entry {
            name: M::NAME,
            decode: decode_boxed::<M>,
        };
        if self.entries.insert(M::NAME, entry).is_some() && self.duplicate.is_none() {
            self.duplicate = Some(M::NAME);
        }
        self
    }

    /// Freeze the registrations.
    ///
    /// # Errors
    ///
    /// Returns [`MessageError::DuplicateName`] if a name was registered more
    /// than once.
    pub fn build(self) -> Result<TypeRegistry, MessageError> {
        match self.duplicate {
            Some(name) => Err(MessageError::DuplicateName(name)),
            None => Ok(TypeRegistry {
                entries: self.entries,
            }),
        }
    }
}
