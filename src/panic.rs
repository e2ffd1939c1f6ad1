//! Rendering of panic payloads caught from session and connection tasks.

use std::{any::Any, fmt};

/// Panic payload that displays as the panic message.
///
/// `String` and `&'static str` payloads, the two `panic!` produces, print
/// verbatim; anything else prints as an opaque placeholder.
///
/// ```
/// use wiresession::panic::format_panic;
///
/// assert_eq!(format_panic(Box::new("boom")).to_string(), "boom");
/// assert_eq!(format_panic(Box::new(String::from("bang"))).to_string(), "bang");
/// assert_eq!(format_panic(Box::new(5_u32)).to_string(), "<non-string panic payload>");
/// ```
#[must_use]
pub struct PanicMessage(Box<dyn Any + Send>);

impl PanicMessage {
    /// Borrow the message when the payload is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        self.0
            .downcast_ref::<String>()
            .map(String::as_str)
            .or_else(|| self.0.downcast_ref::<&'static str>().copied())
    }
}

impl fmt::Display for PanicMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str().unwrap_or("<non-string panic payload>"))
    }
}

impl fmt::Debug for PanicMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PanicMessage").field(&self.to_string()).finish()
    }
}

/// Wrap a payload returned by `catch_unwind` or `JoinError::into_panic`.
pub fn format_panic(panic: Box<dyn Any + Send>) -> PanicMessage { PanicMessage(panic) }
