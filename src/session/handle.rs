//! Cross-task façade over a running session.

use std::{
    fmt,
    sync::{
        Arc,
        OnceLock,
        Weak,
        atomic::{AtomicBool, Ordering},
    },
};

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio_util::sync::CancellationToken;

use super::{SessionError, SessionId, SessionState, state::AtomicState};
use crate::{
    buffer::Buffer,
    hooks::{DecryptFn, DecryptSlot, EncryptFn},
};

pub(crate) struct SessionShared {
    pub(super) id: SessionId,
    closed: AtomicBool,
    pub(super) state: AtomicState,
    outbound: mpsc::Sender<Buffer>,
    encrypt: mpsc::Sender<Option<EncryptFn>>,
    decrypt: OnceLock<DecryptSlot>,
    /// Cancelled once the write loop has closed the connection.
    pub(super) conn_closed: CancellationToken,
}

impl SessionShared {
    pub(super) fn new(
        id: SessionId,
        outbound: mpsc::Sender<Buffer>,
        encrypt: mpsc::Sender<Option<EncryptFn>>,
    ) -> Self {
        Self {
            id,
            closed: AtomicBool::new(false),
            state: AtomicState::new(),
            outbound,
            encrypt,
            decrypt: OnceLock::new(),
            conn_closed: CancellationToken::new(),
        }
    }

    /// Bind the read side's decrypt slot; only the first call has effect.
    pub(super) fn bind_decrypt(&self, slot: Option<DecryptSlot>) {
        if let Some(slot) = slot {
            let _ = self.decrypt.set(slot);
        }
    }

    pub(super) fn set_closed(&self) { self.closed.store(true, Ordering::Release); }

    pub(super) fn is_closed(&self) -> bool { self.closed.load(Ordering::Acquire) }
}

/// Cloneable handle used to talk to a session from any task.
///
/// Dropping every handle does not stop the session; call
/// [`SessionHandle::quit`].
#[derive(Clone)]
pub struct SessionHandle(Arc<SessionShared>);

impl SessionHandle {
    pub(crate) fn from_arc(shared: Arc<SessionShared>) -> Self { Self(shared) }

    pub(crate) fn downgrade(&self) -> Weak<SessionShared> { Arc::downgrade(&self.0) }

    pub(super) fn shared(&self) -> &Arc<SessionShared> { &self.0 }

    /// Identifier of the session.
    #[must_use]
    pub fn id(&self) -> SessionId { self.0.id }

    /// Queue `buf` for writing, waiting while the outbound queue is full.
    ///
    /// The session registers one pending use on the buffer and releases it
    /// after the write, so the same buffer may be sent to several sessions.
    /// Empty buffers are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Closed`] if the session is closing.
    pub async fn send(&self, buf: Buffer) -> Result<(), SessionError> {
        if buf.is_empty() {
            return Ok(());
        }
        if self.is_closed() {
            return Err(SessionError::Closed);
        }
        buf.add(1);
        self.0.outbound.send(buf).await.map_err(|rejected| {
            rejected.0.done();
            SessionError::Closed
        })
    }

    /// Queue `buf` without waiting.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::QueueFull`] if the queue has no room, or
    /// [`SessionError::Closed`] if the session is closing.
    pub fn try_send(&self, buf: Buffer) -> Result<(), SessionError> {
        if buf.is_empty() {
            return Ok(());
        }
        if self.is_closed() {
            return Err(SessionError::Closed);
        }
        buf.add(1);
        self.0.outbound.try_send(buf).map_err(|e| match e {
            TrySendError::Full(buf) => {
                buf.done();
                SessionError::QueueFull
            }
            TrySendError::Closed(buf) => {
                buf.done();
                SessionError::Closed
            }
        })
    }

    /// Ask the session to shut down.
    ///
    /// Only the closed flag is set; the loops notice it on their next wake-up,
    /// drain, close the connection and end. Calling this repeatedly is
    /// harmless.
    pub fn quit(&self) { self.0.set_closed(); }

    /// Returns `true` once the session has been asked to close or has failed.
    #[must_use]
    pub fn is_closed(&self) -> bool { self.0.is_closed() }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> SessionState { self.0.state.load() }

    /// Replace the encrypt transform applied to buffers flagged for
    /// encryption. `None` sends later buffers in the clear.
    ///
    /// Waits while a previous replacement is still pending.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Closed`] if the write loop has ended.
    pub async fn set_encrypt(&self, encrypt: Option<EncryptFn>) -> Result<(), SessionError> {
        self.0
            .encrypt
            .send(encrypt)
            .await
            .map_err(|_| SessionError::Closed)
    }

    /// Replace the decrypt transform; it applies from the next frame.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::DecryptUnsupported`] when the session has no
    /// read side or its frame source cannot decrypt.
    pub fn set_decrypt(&self, decrypt: Option<DecryptFn>) -> Result<(), SessionError> {
        let slot = self.0.decrypt.get().ok_or(SessionError::DecryptUnsupported)?;
        slot.set(decrypt);
        Ok(())
    }

    /// Wait until the connection has been closed by the write loop.
    pub async fn closed(&self) { self.0.conn_closed.cancelled().await; }
}

impl fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionHandle")
            .field("id", &self.id())
            .field("state", &self.state())
            .field("closed", &self.is_closed())
            .finish()
    }
}
