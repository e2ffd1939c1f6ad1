#![doc(html_root_url = "https://docs.rs/wiresession/latest")]
//! Public API for the `wiresession` library.
//!
//! This crate provides the per-connection plumbing of a binary protocol
//! server: length-prefixed framing over streams and datagrams, a typed
//! message codec keyed by message name, reference-counted buffers with a
//! recycling pool, and read/write sessions that drain a bounded outbound
//! queue with optional encrypt and decrypt transforms.
//!
//! ```no_run
//! use wiresession::{
//!     config::ServerConfig,
//!     service::{Service, TcpService, ctrl_c, run_services},
//! };
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), wiresession::server::ServerError> {
//! let mut services: Vec<Box<dyn Service>> = vec![Box::new(TcpService::new(ServerConfig::default()))];
//! run_services(&mut services, ctrl_c()).await
//! # }
//! ```

pub mod buffer;
pub mod config;
pub mod frame;
pub mod hooks;
pub mod message;
pub mod metrics;
pub mod panic;
pub mod server;
pub mod service;
pub mod session;

pub use buffer::{Buffer, BufferPool};
pub use frame::{FrameError, FrameHandler, FrameReader, FrameSource, LengthFormat};
pub use hooks::{DecryptFn, EncryptFn};
pub use message::{DecodedMessage, Message, MessageCodec, MessageError, TypeRegistry};
pub use metrics::{Direction, ERRORS_TOTAL, FRAMES_PROCESSED, SESSIONS_ACTIVE};
pub use session::{
    ReadWriteSession,
    SessionError,
    SessionHandle,
    SessionHooks,
    SessionId,
    SessionRegistry,
    WriteSession,
};
