//! Test support for `wiresession`.
//!
//! Provides an in-memory [`FakeConnection`] that records what sessions write,
//! helpers for building raw frames and a serialised [`logtest`] logger
//! fixture.
//!
//! ```rust
//! use wiresession_testing::{FakeConnection, frame_bytes};
//!
//! let conn = FakeConnection::new();
//! assert!(conn.chunks().is_empty());
//! assert_eq!(frame_bytes(b"hi"), vec![4, 0, b'h', b'i']);
//! ```

mod fake;
mod frames;
mod logging;

pub use fake::FakeConnection;
pub use frames::{FrameRecorder, frame_bytes, frame_bytes_with_width};
pub use logging::{LoggerHandle, logger};
