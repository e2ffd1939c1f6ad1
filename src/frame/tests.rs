//! Unit tests for frame helpers and readers.

use std::{io, sync::Arc, time::Duration};

use bytes::BytesMut;
use rstest::rstest;
use tokio::{
    io::{AsyncWriteExt, duplex},
    net::UdpSocket,
};

use super::{conversion::*, format::*, *};
use crate::hooks::decrypt_fn;

#[rstest]
#[case(vec![0x12], 1, Endianness::Big, 0x12)]
#[case(vec![0x12, 0x34], 2, Endianness::Big, 0x1234)]
#[case(vec![0x34, 0x12], 2, Endianness::Little, 0x1234)]
#[case(vec![0x01, 0x02, 0x03], 3, Endianness::Little, 0x03_0201)]
#[case(vec![0x01, 0x02, 0x03], 3, Endianness::Big, 0x01_0203)]
#[case(vec![1, 0, 0, 0], 4, Endianness::Little, 1)]
#[case(vec![0, 0, 0, 0, 0, 0, 0, 1], 8, Endianness::Big, 1)]
#[case(vec![0xFF, 0xFF], 2, Endianness::Little, 0xFFFF)]
#[case(vec![0xFF; 8], 8, Endianness::Little, u64::MAX)]
fn bytes_to_u64_ok(
    #[case] bytes: Vec<u8>,
    #[case] size: usize,
    #[case] endianness: Endianness,
    #[case] expected: u64,
) {
    assert_eq!(
        bytes_to_u64(&bytes, size, endianness).expect("failed to convert"),
        expected
    );
}

#[rstest]
#[case(0x1234usize, 2, Endianness::Little, vec![0x34, 0x12])]
#[case(0x1234usize, 2, Endianness::Big, vec![0x12, 0x34])]
#[case(0x03_0201usize, 3, Endianness::Little, vec![0x01, 0x02, 0x03])]
#[case(1usize, 4, Endianness::Little, vec![1, 0, 0, 0])]
#[case(1usize, 8, Endianness::Big, vec![0, 0, 0, 0, 0, 0, 0, 1])]
fn u64_to_bytes_ok(
    #[case] value: usize,
    #[case] size: usize,
    #[case] endianness: Endianness,
    #[case] expected: Vec<u8>,
) {
    let mut buf = [0xaau8; 8];
    let written = u64_to_bytes(value, size, endianness, &mut buf).expect("failed to encode u64");
    assert_eq!(written, size);
    assert_eq!(&buf[..written], expected.as_slice());
    assert!(buf[size..].iter().all(|&b| b == 0));
}

#[rstest]
#[case(vec![0x01], 2)]
#[case(vec![0x02, 0x03], 4)]
fn bytes_to_u64_short(#[case] bytes: Vec<u8>, #[case] size: usize) {
    let err = bytes_to_u64(&bytes, size, Endianness::Little).unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
}

#[rstest]
#[case(0)]
#[case(9)]
fn unsupported_widths_are_rejected(#[case] size: usize) {
    let mut buf = [0u8; 8];
    let err = u64_to_bytes(1, size, Endianness::Little, &mut buf).unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    let err = bytes_to_u64(&[0; 16], size, Endianness::Little).unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
}

#[rstest]
#[case(256usize, 1)]
#[case(65_536usize, 2)]
#[case(1usize << 24, 3)]
fn u64_to_bytes_never_truncates(#[case] value: usize, #[case] size: usize) {
    let mut buf = [0u8; 8];
    let err = u64_to_bytes(value, size, Endianness::Little, &mut buf).unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
}

#[test]
fn default_format_is_two_byte_little_endian() {
    assert_eq!(LengthFormat::default(), LengthFormat::u16_le());
    assert_eq!(LengthFormat::default().max_frame_len(), 0xFFFF);
    assert!(LengthFormat::try_new(0, Endianness::Little).is_err());
    assert!(LengthFormat::try_new(3, Endianness::Little).is_ok());
}

#[rstest]
#[case(LengthFormat::new(1, Endianness::Little))]
#[case(LengthFormat::u16_le())]
#[case(LengthFormat::new(3, Endianness::Big))]
fn frame_length_boundaries(#[case] format: LengthFormat) {
    let max = format.max_payload_len();
    for len in [0, 1, max] {
        let mut dst = BytesMut::new();
        format
            .encode_frame(&vec![7u8; len], &mut dst)
            .expect("payload within bounds must encode");
        assert_eq!(dst.len(), len + format.bytes);
        assert_eq!(
            format.read_len(&dst).expect("prefix must decode"),
            len + format.bytes
        );
    }

    let mut dst = BytesMut::new();
    let err = format
        .encode_frame(&vec![7u8; max + 1], &mut dst)
        .expect_err("oversized payload must fail");
    assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    assert!(dst.is_empty(), "nothing may be written on failure");

    // A wider prefix carries the same payload.
    let wider = LengthFormat::new(format.bytes + 1, format.endianness);
    wider
        .encode_frame(&vec![7u8; max + 1], &mut dst)
        .expect("wider prefix must fit");
}

fn collect_into(frames: &Arc<parking_lot::Mutex<Vec<Vec<u8>>>>) -> impl FrameHandler + use<> {
    let frames = Arc::clone(frames);
    move |frame: &[u8]| frames.lock().push(frame.to_vec())
}

#[tokio::test]
async fn reader_assembles_partial_reads() {
    let frames = Arc::new(parking_lot::Mutex::new(Vec::new()));
    let (client, mut server) = duplex(64);
    let mut reader = FrameReader::new(client, collect_into(&frames));

    let writer = tokio::spawn(async move {
        for chunk in [&[7u8][..], &[0, b'h'], &[b'e', b'l'], &[b'l', b'o']] {
            server.write_all(chunk).await.expect("write chunk");
            tokio::task::yield_now().await;
        }
        server
    });

    assert_eq!(reader.read().await.expect("frame"), 7);
    drop(writer.await.expect("writer task"));
    assert_eq!(*frames.lock(), vec![b"\x07\x00hello".to_vec()]);
}

#[tokio::test]
async fn reader_grows_scratch_for_large_frames() {
    let frames = Arc::new(parking_lot::Mutex::new(Vec::new()));
    let payload = vec![0x42u8; DEFAULT_READ_BUFFER * 2];
    let mut wire = BytesMut::new();
    LengthFormat::u32_le()
        .encode_frame(&payload, &mut wire)
        .expect("encode");
    let wire = wire.freeze();

    let mut reader =
        FrameReader::new(&wire[..], collect_into(&frames)).with_format(LengthFormat::u32_le());
    assert_eq!(reader.read().await.expect("frame"), wire.len());
    assert_eq!(frames.lock()[0].len(), wire.len());
}

#[tokio::test]
async fn truncated_body_surfaces_eof() {
    // Declares seven bytes (five of body) but only three arrive.
    let wire: &[u8] = &[7, 0, 1, 2, 3];
    let mut reader = FrameReader::new(wire, DiscardFrames);
    let err = reader.read().await.expect_err("short frame must fail");
    assert!(err.is_eof(), "unexpected error: {err:?}");
}

#[tokio::test]
async fn declared_length_shorter_than_prefix_is_rejected() {
    let wire: &[u8] = &[1, 0, 9, 9];
    let mut reader = FrameReader::new(wire, DiscardFrames);
    let err = reader.read().await.expect_err("must reject");
    assert!(matches!(err, FrameError::FrameTooShort { len: 1, prefix: 2 }));
}

#[tokio::test]
async fn frames_over_the_cap_are_rejected_before_reading() {
    let wire: &[u8] = &[0x00, 0x10];
    let mut reader = FrameReader::new(wire, DiscardFrames);
    reader.set_max_frame_length(1024);
    let err = reader.read().await.expect_err("must reject");
    assert!(matches!(
        err,
        FrameError::FrameTooLarge {
            len: 4096,
            max: 1024
        }
    ));
}

#[tokio::test]
async fn decrypt_applies_to_prefix_and_body_separately() {
    let frames = Arc::new(parking_lot::Mutex::new(Vec::new()));
    let plain = b"\x05\x00abc";
    let cipher: Vec<u8> = plain.iter().map(|b| b ^ 0xff).collect();

    let mut reader = FrameReader::new(&cipher[..], collect_into(&frames));
    let calls = Arc::new(parking_lot::Mutex::new(Vec::new()));
    let seen = Arc::clone(&calls);
    reader
        .set_decrypt(Some(decrypt_fn(move |bytes: &mut [u8]| {
            seen.lock().push(bytes.len());
            for b in bytes.iter_mut() {
                *b ^= 0xff;
            }
        })))
        .expect("stream readers accept decrypt hooks");

    reader.read().await.expect("frame");
    assert_eq!(*frames.lock(), vec![plain.to_vec()]);
    assert_eq!(*calls.lock(), vec![2, 3]);
}

#[tokio::test]
async fn decrypt_swap_lands_on_next_frame() {
    let frames = Arc::new(parking_lot::Mutex::new(Vec::new()));
    let mut wire = b"\x03\x00a".to_vec();
    wire.extend(b"\x03\x00b".iter().map(|b| b ^ 0x0f));

    let mut reader = FrameReader::new(&wire[..], collect_into(&frames));
    let slot = reader.decrypt_slot().expect("stream reader has a slot");
    reader.read().await.expect("first frame");
    slot.set(Some(decrypt_fn(|bytes: &mut [u8]| {
        for b in bytes.iter_mut() {
            *b ^= 0x0f;
        }
    })));
    reader.read().await.expect("second frame");
    assert_eq!(
        *frames.lock(),
        vec![b"\x03\x00a".to_vec(), b"\x03\x00b".to_vec()]
    );
}

#[tokio::test(start_paused = true)]
async fn read_deadline_elapses() {
    let (client, _server) = duplex(16);
    let mut reader = FrameReader::new(client, DiscardFrames);
    reader.set_timeout(Some(Duration::from_secs(1)));
    match reader.read().await {
        Err(FrameError::Io(e)) => assert_eq!(e.kind(), io::ErrorKind::TimedOut),
        other => panic!("expected timeout, got {other:?}"),
    }
}

#[tokio::test]
async fn datagram_reader_delivers_whole_datagrams() {
    let socket = Arc::new(UdpSocket::bind("127.0.0.1:0").await.expect("bind"));
    let addr = socket.local_addr().expect("local addr");
    let sender = UdpSocket::bind("127.0.0.1:0").await.expect("bind sender");
    sender.send_to(b"\x09\x00ignored", addr).await.expect("send");

    let frames = Arc::new(parking_lot::Mutex::new(Vec::new()));
    let mut reader = DatagramReader::new(socket, collect_into(&frames));
    assert_eq!(reader.read().await.expect("datagram"), 9);
    assert_eq!(*frames.lock(), vec![b"\x09\x00ignored".to_vec()]);
    assert_eq!(
        reader.last_peer(),
        Some(sender.local_addr().expect("sender addr"))
    );
}

#[tokio::test]
async fn datagram_reader_rejects_decrypt() {
    let socket = Arc::new(UdpSocket::bind("127.0.0.1:0").await.expect("bind"));
    let reader = DatagramReader::new(socket, DiscardFrames);
    let err = reader
        .set_decrypt(Some(decrypt_fn(|_: &mut [u8]| {})))
        .expect_err("datagram readers cannot decrypt");
    assert!(matches!(err, FrameError::DecryptUnsupported));
    assert!(reader.decrypt_slot().is_none());
}
