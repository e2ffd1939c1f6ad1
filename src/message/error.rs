//! Errors raised by the message codec and registry.

use bincode::error::{DecodeError, EncodeError};
use thiserror::Error;

/// Errors produced while encoding or decoding messages.
#[derive(Debug, Error)]
pub enum MessageError {
    /// Fewer bytes remain than the next header field requires.
    #[error("message too short: needed {needed} bytes, {remaining} remaining")]
    TooShort {
        /// Bytes the field requires.
        needed: usize,
        /// Bytes left in the input.
        remaining: usize,
    },
    /// The declared total is smaller than the header already parsed.
    #[error("declared message length {declared} is shorter than its {header}-byte header")]
    LengthMismatch {
        /// Total length declared by the first prefix.
        declared: usize,
        /// Bytes consumed by the header.
        header: usize,
    },
    /// No type is registered under the name.
    #[error("unknown message name: {0}")]
    UnknownMessageName(String),
    /// Body serialization failed.
    #[error("failed to encode message body: {0}")]
    Encode(#[from] EncodeError),
    /// Body deserialization failed.
    #[error("failed to decode message body: {0}")]
    Decode(#[from] DecodeError),
    /// The encoded message does not fit the length prefix.
    #[error("encoded message of {0} bytes exceeds the length prefix")]
    FrameTooLarge(usize),
    /// Two types were registered under the same name.
    #[error("message name registered twice: {0}")]
    DuplicateName(&'static str),
}

impl MessageError {
    /// Returns `true` for header underruns.
    #[must_use]
    pub fn is_underrun(&self) -> bool { matches!(self, Self::TooShort { .. }) }
}
