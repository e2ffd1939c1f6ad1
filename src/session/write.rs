//! Write-only session and the write loop shared with read/write sessions.

use std::{io, sync::Arc, time::Duration};

use log::{debug, info};
use tokio::{
    io::{AsyncWrite, AsyncWriteExt},
    sync::{mpsc, oneshot},
    time::{MissedTickBehavior, interval},
};

use super::{
    SessionHandle,
    SessionHooks,
    SessionId,
    SessionState,
    handle::SessionShared,
    run_hook,
};
use crate::{
    buffer::Buffer,
    hooks::EncryptFn,
    metrics::{self, Direction},
};

/// Outbound queue length used when a zero size is requested.
pub const DEFAULT_QUEUE_SIZE: usize = 4096;

/// How often an idle write loop re-checks the closed flag.
pub const CLOSE_CHECK_INTERVAL: Duration = Duration::from_secs(1);

pub(super) struct WriteHalf<W> {
    pub(super) conn: W,
    pub(super) outbound: mpsc::Receiver<Buffer>,
    pub(super) encrypt: mpsc::Receiver<Option<EncryptFn>>,
}

pub(super) fn channels<W>(
    id: SessionId,
    conn: W,
    queue_size: usize,
) -> (Arc<SessionShared>, WriteHalf<W>) {
    let queue_size = if queue_size == 0 {
        DEFAULT_QUEUE_SIZE
    } else {
        queue_size
    };
    let (out_tx, out_rx) = mpsc::channel(queue_size);
    let (enc_tx, enc_rx) = mpsc::channel(1);
    let shared = Arc::new(SessionShared::new(id, out_tx, enc_tx));
    let half = WriteHalf {
        conn,
        outbound: out_rx,
        encrypt: enc_rx,
    };
    (shared, half)
}

/// Session owning only the write side of a connection.
///
/// Buffers queued through [`SessionHandle::send`] are written in order by a
/// single write loop. The loop closes the connection when the session quits
/// or a write fails.
pub struct WriteSession<W> {
    shared: Arc<SessionShared>,
    half: WriteHalf<W>,
}

impl<W> WriteSession<W>
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    /// Create a session over `conn` with an outbound queue of `queue_size`
    /// buffers ([`DEFAULT_QUEUE_SIZE`] when zero).
    pub fn new(id: SessionId, conn: W, queue_size: usize) -> Self {
        let (shared, half) = channels(id, conn, queue_size);
        Self { shared, half }
    }

    /// Handle for sending, swapping transforms and quitting.
    #[must_use]
    pub fn handle(&self) -> SessionHandle { SessionHandle::from_arc(Arc::clone(&self.shared)) }

    /// Run the session to completion.
    ///
    /// `on_new_session` runs after the write loop has started and
    /// `on_quit_session` after it has closed the connection.
    pub async fn run(self, hooks: SessionHooks) {
        let Self { shared, half } = self;
        let handle = SessionHandle::from_arc(Arc::clone(&shared));
        let (started_tx, started_rx) = oneshot::channel();
        let writer = tokio::spawn(write_loop(half, Arc::clone(&shared), started_tx));
        let _ = started_rx.await;

        opened(&handle);
        run_hook(hooks.on_new, &handle);

        super::join_loop(writer, "write", &shared).await;
        shared.conn_closed.cancel();

        finished(&handle);
        run_hook(hooks.on_quit, &handle);
    }
}

pub(super) fn opened(handle: &SessionHandle) {
    handle.shared().state.advance(SessionState::Running);
    metrics::inc_sessions();
    info!("session opened: id={}", handle.id());
}

pub(super) fn finished(handle: &SessionHandle) {
    handle.shared().state.advance(SessionState::Closed);
    metrics::dec_sessions();
    info!("session closed: id={}", handle.id());
    tracing::info!(session = %handle.id(), "session closed");
}

pub(super) async fn write_loop<W>(
    half: WriteHalf<W>,
    shared: Arc<SessionShared>,
    started: oneshot::Sender<()>,
) where
    W: AsyncWrite + Unpin + Send,
{
    let WriteHalf {
        mut conn,
        mut outbound,
        encrypt: mut encrypt_rx,
    } = half;
    let mut encrypt: Option<EncryptFn> = None;
    let mut scratch = Vec::new();
    let mut tick = interval(CLOSE_CHECK_INTERVAL);
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let _ = started.send(());

    while !shared.is_closed() {
        tokio::select! {
            biased;
            Some(next) = encrypt_rx.recv() => encrypt = next,
            Some(buf) = outbound.recv() => {
                if let Err(e) = write_buffer(&mut conn, &buf, encrypt.as_ref(), &mut scratch).await {
                    debug!("session write failed: id={}, error={e}", shared.id);
                    metrics::inc_errors();
                    shared.set_closed();
                }
            }
            _ = tick.tick() => {}
        }
    }
    shared.state.advance(SessionState::Draining);

    // One pass over what was queued when the close was observed.
    let remain = outbound.len();
    for _ in 0..remain {
        let Ok(buf) = outbound.try_recv() else { break };
        if write_buffer(&mut conn, &buf, encrypt.as_ref(), &mut scratch)
            .await
            .is_err()
        {
            break;
        }
    }
    outbound.close();
    while let Ok(buf) = outbound.try_recv() {
        buf.done();
    }

    if let Err(e) = conn.shutdown().await {
        debug!("session connection shutdown failed: id={}, error={e}", shared.id);
    }
    drop(conn);
    shared.conn_closed.cancel();
    debug!("session write loop ended: id={}", shared.id);
}

/// Write one buffer, encrypting it when both the buffer and the session ask
/// for it. The buffer's pending use is released whatever the outcome.
async fn write_buffer<W>(
    conn: &mut W,
    buf: &Buffer,
    encrypt: Option<&EncryptFn>,
    scratch: &mut Vec<u8>,
) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let encrypt = encrypt.filter(|_| buf.encrypt());
    // The buffer lock cannot be held across `.await`, so plain buffers are
    // copied out too; `scratch` is reused so the copy does not allocate.
    buf.with_bytes(|src| {
        scratch.clear();
        match encrypt {
            Some(f) => {
                scratch.resize(src.len(), 0);
                f(scratch.as_mut_slice(), src);
            }
            None => scratch.extend_from_slice(src),
        }
    });
    let result = async {
        conn.write_all(scratch).await?;
        conn.flush().await
    }
    .await;
    buf.done();
    if result.is_ok() {
        metrics::inc_frames(Direction::Outbound);
    }
    result
}
