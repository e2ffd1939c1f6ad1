//! Frame handler answering each frame with an identical copy.

use log::debug;

use crate::{
    buffer::BufferPool,
    frame::FrameHandler,
    session::SessionHandle,
};

/// Echoes every inbound frame back on its own session.
///
/// The reply is copied into a pooled buffer since the frame slice is only
/// valid during the call. The buffer goes back to the pool straight away;
/// the pool holds it until the write loop has released it.
pub struct EchoHandler {
    session: SessionHandle,
    pool: BufferPool,
}

impl EchoHandler {
    /// Echo frames on `session` using buffers from `pool`.
    #[must_use]
    pub fn new(session: SessionHandle, pool: BufferPool) -> Self { Self { session, pool } }
}

impl FrameHandler for EchoHandler {
    fn on_frame(&mut self, frame: &[u8]) {
        let (buf, from_pool) = self.pool.get();
        buf.extend_from_slice(frame);
        if let Err(e) = self.session.try_send(buf.clone()) {
            debug!("echo dropped: session={}, error={e}", self.session.id());
        }
        self.pool.put(buf, from_pool);
    }
}

/// Handler factory for a [`TcpConnector`](crate::server::TcpConnector).
pub fn echo_handler(pool: BufferPool) -> impl Fn(SessionHandle) -> EchoHandler + Send + Sync + 'static {
    move |session| EchoHandler::new(session, pool.clone())
}
