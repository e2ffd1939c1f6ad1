//! Session pairing a frame source with the write loop.

use std::sync::Arc;

use log::debug;
use tokio::{io::AsyncWrite, sync::oneshot};

use super::{
    SessionHandle,
    SessionHooks,
    SessionId,
    SessionState,
    handle::SessionShared,
    join_loop,
    run_hook,
    write::{self, WriteHalf, finished, opened, write_loop},
};
use crate::{
    frame::{FrameError, FrameSource},
    metrics,
};

/// Session with a read loop driving a [`FrameSource`] and a write loop
/// draining the outbound queue.
///
/// Either loop failing sets the closed flag. The write loop then drains,
/// closes the connection and releases the read loop; `on_quit_session` runs
/// only after both loops have ended.
pub struct ReadWriteSession<S, W> {
    shared: Arc<SessionShared>,
    half: WriteHalf<W>,
    source: S,
}

impl<S, W> ReadWriteSession<S, W>
where
    S: FrameSource + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    /// Create a session reading frames from `source` and writing to `conn`.
    ///
    /// A `queue_size` of zero selects
    /// [`DEFAULT_QUEUE_SIZE`](super::DEFAULT_QUEUE_SIZE).
    pub fn new(id: SessionId, source: S, conn: W, queue_size: usize) -> Self {
        Self::with_source(id, conn, queue_size, |_| source)
    }

    /// Create a session whose frame source is built from its own handle.
    ///
    /// Frame handlers that answer on the same connection need the handle
    /// before the reader exists.
    pub fn with_source<F>(id: SessionId, conn: W, queue_size: usize, make_source: F) -> Self
    where
        F: FnOnce(SessionHandle) -> S,
    {
        let (shared, half) = write::channels(id, conn, queue_size);
        let source = make_source(SessionHandle::from_arc(Arc::clone(&shared)));
        shared.bind_decrypt(source.decrypt_slot());
        Self {
            shared,
            half,
            source,
        }
    }

    /// Handle for sending, swapping transforms and quitting.
    #[must_use]
    pub fn handle(&self) -> SessionHandle { SessionHandle::from_arc(Arc::clone(&self.shared)) }

    /// Run both loops to completion.
    pub async fn run(self, hooks: SessionHooks) {
        let Self {
            shared,
            half,
            source,
        } = self;
        let handle = SessionHandle::from_arc(Arc::clone(&shared));

        let (read_tx, read_started) = oneshot::channel();
        let (write_tx, write_started) = oneshot::channel();
        let reader = tokio::spawn(read_loop(source, Arc::clone(&shared), read_tx));
        let writer = tokio::spawn(write_loop(half, Arc::clone(&shared), write_tx));
        let _ = read_started.await;
        let _ = write_started.await;

        opened(&handle);
        run_hook(hooks.on_new, &handle);

        tokio::join!(join_loop(reader, "read", &shared), async {
            join_loop(writer, "write", &shared).await;
            shared.conn_closed.cancel();
        });

        finished(&handle);
        run_hook(hooks.on_quit, &handle);
    }
}

async fn read_loop<S: FrameSource>(
    mut source: S,
    shared: Arc<SessionShared>,
    started: oneshot::Sender<()>,
) {
    let _ = started.send(());
    loop {
        let result = tokio::select! {
            biased;
            () = shared.conn_closed.cancelled() => break,
            result = source.read() => result,
        };
        if let Err(e) = result {
            log_read_error(&shared, &e);
            shared.set_closed();
        }
        if shared.is_closed() {
            break;
        }
    }
    shared.state.advance(SessionState::Draining);
    debug!("session read loop ended: id={}", shared.id);
}

fn log_read_error(shared: &SessionShared, e: &FrameError) {
    if e.is_eof() {
        debug!("session peer closed connection: id={}", shared.id);
    } else {
        debug!("session read failed: id={}, error={e}", shared.id);
        metrics::inc_errors();
    }
}
