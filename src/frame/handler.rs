//! Callbacks receiving complete frames.

/// Receives each complete frame read off a connection.
///
/// The slice covers the whole frame, length prefix included, after any
/// decrypt transform has run. It is only valid for the duration of the call;
/// the reader reuses its scratch buffer for the next frame.
pub trait FrameHandler: Send {
    /// Handle one frame.
    fn on_frame(&mut self, frame: &[u8]);
}

impl<F> FrameHandler for F
where
    F: FnMut(&[u8]) + Send,
{
    fn on_frame(&mut self, frame: &[u8]) { self(frame) }
}

/// Handler that discards every frame.
#[derive(Clone, Copy, Debug, Default)]
pub struct DiscardFrames;

impl FrameHandler for DiscardFrames {
    fn on_frame(&mut self, _frame: &[u8]) {}
}
