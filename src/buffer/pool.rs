//! Pool recycling buffers once every pending writer has released them.

use std::{sync::Arc, time::Duration};

use parking_lot::Mutex;
use tokio::sync::mpsc;

use super::Buffer;
use crate::metrics::{self, DropReason};

/// Longest time the reclaim worker waits for a buffer to become quiescent.
pub const MAX_GC_TIME: Duration = Duration::from_secs(1);

/// Capacity of freshly allocated buffers.
pub const DEFAULT_BUFFER_CAPACITY: usize = 512;

/// Recycles [`Buffer`]s through a bounded reclamation queue.
///
/// [`BufferPool::put`] never blocks: when the reclamation queue is full the
/// buffer is simply dropped. A single background worker drains the queue,
/// waits up to [`MAX_GC_TIME`] for each buffer's pending count to reach zero
/// and only then makes it available to [`BufferPool::get`]. Buffers still in
/// use after the wait are discarded, so a handed-out buffer never carries
/// outstanding users.
///
/// The worker runs until every clone of the pool has been dropped.
#[derive(Clone)]
pub struct BufferPool {
    idle: Arc<Mutex<Vec<Buffer>>>,
    reclaim: mpsc::Sender<Buffer>,
}

impl BufferPool {
    /// Create a pool pre-filled with `init_size` buffers whose reclamation
    /// queue holds up to `max_size` entries.
    ///
    /// `max_size` is raised to `init_size` when smaller.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    #[must_use]
    pub fn new(init_size: usize, max_size: usize) -> Self {
        let max_size = max_size.max(init_size).max(1);
        let idle = Arc::new(Mutex::new(
            (0..init_size).map(|_| Buffer::new()).collect::<Vec<_>>(),
        ));
        let (reclaim, rx) = mpsc::channel(max_size);
        tokio::spawn(reclaim_worker(Arc::clone(&idle), max_size, rx));
        Self { idle, reclaim }
    }

    /// Take a buffer, allocating when none is idle.
    ///
    /// The flag is `true` when the buffer came from the pool; it must be
    /// passed back to [`BufferPool::put`]. Pooled buffers are reset first.
    #[must_use]
    pub fn get(&self) -> (Buffer, bool) {
        let mut idle = self.idle.lock();
        while let Some(buf) = idle.pop() {
            // A clone escaped the writer that released it; never hand it out.
            if buf.pending() != 0 {
                metrics::inc_buffers_dropped(DropReason::StillInUse);
                continue;
            }
            drop(idle);
            buf.reset();
            return (buf, true);
        }
        (Buffer::new(), false)
    }

    /// Hand a buffer back for reclamation.
    ///
    /// Only buffers obtained from the pool are reclaimed; others are dropped.
    pub fn put(&self, buf: Buffer, from_pool: bool) {
        if !from_pool {
            return;
        }
        if self.reclaim.try_send(buf).is_err() {
            log::debug!("buffer reclamation queue full; dropping buffer");
            metrics::inc_buffers_dropped(DropReason::QueueFull);
        }
    }

    /// Number of buffers ready to be handed out.
    #[must_use]
    pub fn idle_len(&self) -> usize { self.idle.lock().len() }
}

async fn reclaim_worker(idle: Arc<Mutex<Vec<Buffer>>>, cap: usize, mut rx: mpsc::Receiver<Buffer>) {
    while let Some(buf) = rx.recv().await {
        if !buf.gc(MAX_GC_TIME).await {
            log::debug!("buffer still in use after {MAX_GC_TIME:?}; dropping");
            metrics::inc_buffers_dropped(DropReason::StillInUse);
            continue;
        }
        let mut idle = idle.lock();
        if idle.len() < cap {
            idle.push(buf);
            metrics::inc_buffers_recycled();
        } else {
            metrics::inc_buffers_dropped(DropReason::QueueFull);
        }
    }
    log::trace!("buffer pool dropped; reclaim worker exiting");
}
