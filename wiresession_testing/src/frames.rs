use std::sync::Arc;

use bytes::BytesMut;
use parking_lot::Mutex;
use wiresession::frame::{Endianness, LengthFormat};

/// Build a frame with the default two-byte little-endian prefix.
///
/// # Panics
///
/// Panics if the payload does not fit the prefix.
#[must_use]
pub fn frame_bytes(payload: &[u8]) -> Vec<u8> { frame_bytes_with_width(payload, 2) }

/// Build a frame with a little-endian prefix `width` bytes wide.
///
/// # Panics
///
/// Panics if `width` is not in `1..=8` or the payload does not fit.
#[must_use]
pub fn frame_bytes_with_width(payload: &[u8], width: usize) -> Vec<u8> {
    let mut dst = BytesMut::new();
    LengthFormat::new(width, Endianness::Little)
        .encode_frame(payload, &mut dst)
        .expect("payload too large for prefix");
    dst.to_vec()
}

/// Collects frames delivered to a frame handler.
#[derive(Clone, Default)]
pub struct FrameRecorder(Arc<Mutex<Vec<Vec<u8>>>>);

impl FrameRecorder {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Closure recording every frame it is called with.
    pub fn handler(&self) -> impl FnMut(&[u8]) + Send + 'static {
        let frames = Arc::clone(&self.0);
        move |frame: &[u8]| frames.lock().push(frame.to_vec())
    }

    /// Frames recorded so far.
    #[must_use]
    pub fn frames(&self) -> Vec<Vec<u8>> { self.0.lock().clone() }

    /// Number of frames recorded so far.
    #[must_use]
    pub fn len(&self) -> usize { self.0.lock().len() }

    /// Returns `true` if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.0.lock().is_empty() }
}
