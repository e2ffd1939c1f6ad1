use log::warn;

use super::{DecodedMessage, MessageCodec, MessageError};
use crate::{frame::FrameHandler, metrics};

/// Frame handler decoding each frame into a message.
///
/// Frames that fail to decode are logged and dropped; the connection stays
/// open.
pub struct MessageHandler<F> {
    codec: MessageCodec,
    on_message: F,
}

impl<F> MessageHandler<F>
where
    F: FnMut(DecodedMessage) + Send,
{
    /// Forward every decoded message to `on_message`.
    pub fn new(codec: MessageCodec, on_message: F) -> Self { Self { codec, on_message } }

    /// Codec used to decode frames.
    pub fn codec(&self) -> &MessageCodec { &self.codec }
}

impl<F> FrameHandler for MessageHandler<F>
where
    F: FnMut(DecodedMessage) + Send,
{
    fn on_frame(&mut self, frame: &[u8]) {
        match self.codec.decode(frame) {
            Ok(msg) => (self.on_message)(msg),
            Err(MessageError::UnknownMessageName(name)) => {
                warn!("dropping frame with unknown message name: name={name:?}");
                metrics::inc_errors();
            }
            Err(e) => {
                warn!("dropping undecodable message frame: len={}, error={e}", frame.len());
                metrics::inc_errors();
            }
        }
    }
}
