//! Per-connection sessions.
//!
//! A session owns one connection. Its write loop drains a bounded queue of
//! [`Buffer`](crate::buffer::Buffer)s to the connection in FIFO order,
//! applying an optional encrypt transform. A [`ReadWriteSession`] adds a read
//! loop pulling frames from a [`FrameSource`](crate::frame::FrameSource).
//!
//! Shutdown is cooperative: [`SessionHandle::quit`] and I/O failures only set
//! a closed flag. The write loop notices it within
//! [`CLOSE_CHECK_INTERVAL`], writes what was queued at that moment, closes
//! the connection exactly once and unblocks the read loop. Lifecycle hooks
//! run after both loops have started and after both have ended.

use std::fmt;

use log::error;
use tokio::task::JoinHandle;

mod error;
mod handle;
mod hooks;
mod read_write;
mod registry;
mod state;
mod write;

pub use error::SessionError;
pub use handle::SessionHandle;
pub use hooks::SessionHooks;
pub use read_write::ReadWriteSession;
pub use registry::SessionRegistry;
pub use state::SessionState;
pub use write::{CLOSE_CHECK_INTERVAL, DEFAULT_QUEUE_SIZE, WriteSession};

use crate::{metrics, panic::format_panic};

/// Identifier assigned to a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl From<u64> for SessionId {
    fn from(value: u64) -> Self { Self(value) }
}

impl SessionId {
    /// Create a new [`SessionId`] with the provided value.
    #[must_use]
    pub fn new(id: u64) -> Self { Self(id) }

    /// Return the inner `u64` representation.
    #[must_use]
    pub fn as_u64(&self) -> u64 { self.0 }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

fn run_hook(hook: Option<Box<dyn FnOnce(&SessionHandle) + Send>>, handle: &SessionHandle) {
    if let Some(hook) = hook {
        hook(handle);
    }
}

/// Wait for a loop task, closing the session if it panicked.
async fn join_loop(task: JoinHandle<()>, name: &str, shared: &handle::SessionShared) {
    if let Err(e) = task.await {
        shared.set_closed();
        if e.is_panic() {
            metrics::inc_connection_panics();
            let panic_msg = format_panic(e.into_panic());
            error!("session {name} loop panicked: id={}, panic={panic_msg}", shared.id);
            tracing::error!(session = %shared.id, panic = %panic_msg, "session {name} loop panicked");
        }
    }
}
