//! Test helpers shared across server modules.

use std::time::Duration;

use rstest::fixture;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpStream,
};

use crate::{buffer::Buffer, session::SessionHandle};

/// Frame handler factory answering every frame with an identical copy.
#[fixture]
#[allow(unused_braces)]
pub fn echo() -> impl Fn(SessionHandle) -> Box<dyn FnMut(&[u8]) + Send> + Send + Sync + 'static {
    |handle: SessionHandle| -> Box<dyn FnMut(&[u8]) + Send> {
        Box::new(move |frame: &[u8]| {
            let _ = handle.try_send(Buffer::from_slice(frame));
        })
    }
}

/// Write `frame` to `stream` and read back exactly `expect_len` bytes.
pub async fn round_trip(stream: &mut TcpStream, frame: &[u8], expect_len: usize) -> Vec<u8> {
    stream.write_all(frame).await.expect("write frame");
    let mut reply = vec![0; expect_len];
    tokio::time::timeout(Duration::from_secs(2), stream.read_exact(&mut reply))
        .await
        .expect("reply in time")
        .expect("read reply");
    reply
}
