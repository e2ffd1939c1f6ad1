//! Reference-counted outbound buffers and their reclamation pool.
//!
//! A [`Buffer`] is a cheaply cloneable handle around a byte region plus a
//! pending-use counter. Every session a buffer is queued on calls
//! [`Buffer::add`] before the hand-off and [`Buffer::done`] after the write,
//! so a buffer broadcast to many sessions only becomes reusable once every
//! writer has finished with it. [`BufferPool`] waits for that quiescence
//! before recycling.

use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::Duration,
};

use bytes::BytesMut;
use parking_lot::Mutex;
use tokio::{
    sync::Notify,
    time::{Instant, timeout_at},
};

mod pool;

pub use pool::{BufferPool, DEFAULT_BUFFER_CAPACITY, MAX_GC_TIME};

struct Inner {
    data: Mutex<BytesMut>,
    encrypt: AtomicBool,
    pending: AtomicUsize,
    idle: Notify,
}

/// Shared outbound byte buffer with a pending-write counter.
///
/// Cloning a `Buffer` clones the handle, not the bytes.
#[derive(Clone)]
pub struct Buffer {
    inner: Arc<Inner>,
}

impl Buffer {
    /// Create an empty buffer.
    #[must_use]
    pub fn new() -> Self { Self::with_capacity(DEFAULT_BUFFER_CAPACITY) }

    /// Create an empty buffer able to hold `capacity` bytes without
    /// reallocating.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Inner {
                data: Mutex::new(BytesMut::with_capacity(capacity)),
                encrypt: AtomicBool::new(false),
                pending: AtomicUsize::new(0),
                idle: Notify::new(),
            }),
        }
    }

    /// Create a buffer holding a copy of `bytes`.
    #[must_use]
    pub fn from_slice(bytes: &[u8]) -> Self {
        let buf = Self::with_capacity(bytes.len());
        buf.extend_from_slice(bytes);
        buf
    }

    /// Register `n` outstanding users of the buffer.
    pub fn add(&self, n: usize) { self.inner.pending.fetch_add(n, Ordering::AcqRel); }

    /// Release one outstanding use.
    ///
    /// Waiters in [`Buffer::gc`] are woken when the counter reaches zero. An
    /// unmatched call is ignored rather than wrapping the counter.
    pub fn done(&self) {
        let prev = self
            .inner
            .pending
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));
        match prev {
            Ok(1) => self.inner.idle.notify_waiters(),
            Ok(_) => {}
            Err(_) => log::warn!("buffer released more times than it was acquired"),
        }
    }

    /// Number of outstanding uses.
    #[must_use]
    pub fn pending(&self) -> usize { self.inner.pending.load(Ordering::Acquire) }

    /// Wait up to `timeout` for every outstanding use to be released.
    ///
    /// Returns `true` once the buffer is quiescent and safe to reuse, or
    /// `false` if uses remain when the timeout elapses.
    pub async fn gc(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            let notified = self.inner.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.pending() == 0 {
                return true;
            }
            if timeout_at(deadline, notified).await.is_err() {
                return self.pending() == 0;
            }
        }
    }

    /// Clear the contents and encrypt flag, keeping the allocation.
    pub fn reset(&self) {
        self.inner.data.lock().clear();
        self.inner.encrypt.store(false, Ordering::Release);
    }

    /// Append `bytes` to the buffer.
    pub fn extend_from_slice(&self, bytes: &[u8]) { self.inner.data.lock().extend_from_slice(bytes); }

    /// Run `f` with mutable access to the underlying bytes.
    pub fn with_mut<T>(&self, f: impl FnOnce(&mut BytesMut) -> T) -> T { f(&mut self.inner.data.lock()) }

    /// Run `f` with read access to the underlying bytes.
    pub fn with_bytes<T>(&self, f: impl FnOnce(&[u8]) -> T) -> T { f(&self.inner.data.lock()) }

    /// Copy the contents out into a fresh vector.
    #[must_use]
    pub fn to_vec(&self) -> Vec<u8> { self.with_bytes(<[u8]>::to_vec) }

    /// Number of bytes held.
    #[must_use]
    pub fn len(&self) -> usize { self.inner.data.lock().len() }

    /// Returns `true` if the buffer holds no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.len() == 0 }

    /// Mark whether the session's encrypt transform should apply.
    pub fn set_encrypt(&self, encrypt: bool) { self.inner.encrypt.store(encrypt, Ordering::Release); }

    /// Whether the session's encrypt transform should apply.
    #[must_use]
    pub fn encrypt(&self) -> bool { self.inner.encrypt.load(Ordering::Acquire) }

    /// Returns `true` if both handles refer to the same buffer.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool { Arc::ptr_eq(&self.inner, &other.inner) }
}

impl Default for Buffer {
    fn default() -> Self { Self::new() }
}

impl fmt::Debug for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("len", &self.len())
            .field("pending", &self.pending())
            .field("encrypt", &self.encrypt())
            .finish()
    }
}

impl From<&[u8]> for Buffer {
    fn from(bytes: &[u8]) -> Self { Self::from_slice(bytes) }
}
