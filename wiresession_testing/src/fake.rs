use std::{
    io,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};

use parking_lot::Mutex;
use tokio::io::AsyncWrite;

#[derive(Default)]
struct State {
    chunks: Vec<Vec<u8>>,
    shutdowns: usize,
    fail_after: Option<usize>,
}

/// In-memory write side of a connection.
///
/// Clones share state, so a test can keep one clone while a session owns
/// another. Every successful `poll_write` is recorded as one chunk.
#[derive(Clone, Default)]
pub struct FakeConnection(Arc<Mutex<State>>);

impl FakeConnection {
    /// Create a connection that accepts every write.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Fail every write once `n` writes have succeeded.
    #[must_use]
    pub fn failing_after(n: usize) -> Self {
        let conn = Self::new();
        conn.0.lock().fail_after = Some(n);
        conn
    }

    /// Start failing writes from now on.
    pub fn fail_writes(&self) {
        let mut state = self.0.lock();
        state.fail_after = Some(state.chunks.len());
    }

    /// Chunks written so far, in order.
    #[must_use]
    pub fn chunks(&self) -> Vec<Vec<u8>> { self.0.lock().chunks.clone() }

    /// All bytes written so far.
    #[must_use]
    pub fn written(&self) -> Vec<u8> { self.0.lock().chunks.concat() }

    /// Number of times the connection was shut down.
    #[must_use]
    pub fn shutdown_count(&self) -> usize { self.0.lock().shutdowns }
}

impl AsyncWrite for FakeConnection {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let mut state = self.0.lock();
        if state.shutdowns > 0 {
            return Poll::Ready(Err(io::ErrorKind::NotConnected.into()));
        }
        if state.fail_after.is_some_and(|n| state.chunks.len() >= n) {
            return Poll::Ready(Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "injected write failure",
            )));
        }
        state.chunks.push(buf.to_vec());
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        self.0.lock().shutdowns += 1;
        Poll::Ready(Ok(()))
    }
}
