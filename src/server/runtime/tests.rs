//! Tests for the TCP listener and accept loop.

use std::{
    io,
    sync::{Arc, Mutex},
};

use rstest::rstest;
use tokio::{
    io::AsyncReadExt,
    net::{TcpListener as TokioTcpListener, TcpStream},
    task::yield_now,
    time::{Duration, Instant, advance, timeout},
};
use tokio_util::{sync::CancellationToken, task::TaskTracker};
use wiresession_testing::frame_bytes;

use super::{BackoffConfig, MockAcceptListener, TcpListener, accept_loop};
use crate::{
    server::{
        ServerError,
        TcpConnector,
        test_util::{echo, round_trip},
    },
    session::SessionHandle,
};

#[tokio::test]
async fn stop_ends_an_idle_listener() {
    let listener = TcpListener::new();
    listener
        .listen_and_serve("127.0.0.1:0", Arc::new(TcpConnector::discarding()), true)
        .await
        .expect("bind");
    listener.stop();
    timeout(Duration::from_millis(500), listener.wait())
        .await
        .expect("listener stops");
}

#[tokio::test]
async fn accept_loop_stops_on_shutdown() {
    let token = CancellationToken::new();
    let tracker = TaskTracker::new();
    let listener = Arc::new(
        TokioTcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind test listener"),
    );

    tracker.spawn(accept_loop(
        listener,
        Arc::new(TcpConnector::discarding()),
        token.clone(),
        tracker.clone(),
        BackoffConfig::default(),
    ));

    token.cancel();
    tracker.close();
    let result = timeout(Duration::from_millis(100), tracker.wait()).await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn binding_a_taken_address_fails() {
    let taken = TokioTcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = taken.local_addr().expect("addr").to_string();
    let err = TcpListener::new()
        .listen_and_serve(&addr, Arc::new(TcpConnector::discarding()), true)
        .await
        .expect_err("address in use");
    assert!(matches!(err, ServerError::Bind { addr: ref a, .. } if *a == addr));
}

#[rstest]
#[tokio::test]
async fn echo_sessions_answer_each_frame(
    echo: impl Fn(SessionHandle) -> Box<dyn FnMut(&[u8]) + Send> + Send + Sync + 'static,
) {
    let listener = TcpListener::new();
    let addr = listener
        .listen_and_serve("127.0.0.1:0", Arc::new(TcpConnector::new(echo)), true)
        .await
        .expect("bind");

    let mut client = TcpStream::connect(addr).await.expect("connect");
    for payload in [&b"hello"[..], b"again"] {
        let frame = frame_bytes(payload);
        assert_eq!(round_trip(&mut client, &frame, frame.len()).await, frame);
    }

    listener.stop();
    drop(client);
    timeout(Duration::from_secs(3), listener.wait())
        .await
        .expect("connections drain");
}

#[tokio::test]
async fn malformed_frames_close_the_connection() {
    let listener = TcpListener::new();
    let addr = listener
        .listen_and_serve("127.0.0.1:0", Arc::new(TcpConnector::discarding()), true)
        .await
        .expect("bind");

    let mut client = TcpStream::connect(addr).await.expect("connect");
    // A declared length shorter than the prefix itself.
    tokio::io::AsyncWriteExt::write_all(&mut client, &[1, 0])
        .await
        .expect("write");
    let mut rest = Vec::new();
    let n = timeout(Duration::from_secs(3), client.read_to_end(&mut rest))
        .await
        .expect("server closes")
        .expect("read");
    assert_eq!(n, 0);

    listener.stop();
    listener.wait().await;
}

/// Creates a mock listener that fails with exponential backoff tracking.
fn setup_backoff_mock_listener(
    calls: &Arc<Mutex<Vec<Instant>>>,
    num_calls: usize,
) -> MockAcceptListener {
    let mut listener = MockAcceptListener::new();
    let call_log = Arc::clone(calls);
    listener
        .expect_accept()
        .returning(move || {
            let call_log = Arc::clone(&call_log);
            Box::pin(async move {
                call_log.lock().expect("lock").push(Instant::now());
                Err(io::Error::other("mock error"))
            })
        })
        .times(num_calls);
    listener
        .expect_local_addr()
        .returning(|| Ok("127.0.0.1:0".parse().expect("addr parse")))
        .times(num_calls);
    listener
}

fn intervals(calls: &[Instant]) -> Vec<Duration> {
    calls
        .windows(2)
        .map(|pair| pair[1].duration_since(pair[0]))
        .collect()
}

#[tokio::test(start_paused = true)]
async fn accept_failures_back_off_exponentially() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let listener = Arc::new(setup_backoff_mock_listener(&calls, 4));
    let token = CancellationToken::new();
    let tracker = TaskTracker::new();
    let backoff = BackoffConfig {
        initial_delay: Duration::from_millis(5),
        max_delay: Duration::from_millis(20),
    };

    tracker.spawn(accept_loop(
        listener,
        Arc::new(TcpConnector::discarding()),
        token.clone(),
        tracker.clone(),
        backoff,
    ));

    yield_now().await;
    assert_eq!(calls.lock().expect("lock").len(), 1);

    for ms in [5, 10, 20] {
        advance(Duration::from_millis(ms)).await;
        yield_now().await;
    }

    token.cancel();
    advance(Duration::from_millis(20)).await;
    yield_now().await;
    tracker.close();
    tracker.wait().await;

    let calls = calls.lock().expect("lock");
    assert_eq!(calls.len(), 4);
    assert_eq!(
        intervals(&calls),
        vec![
            Duration::from_millis(5),
            Duration::from_millis(10),
            Duration::from_millis(20),
        ]
    );
}

#[rstest]
#[case(BackoffConfig::default(), Duration::from_millis(10), Duration::from_millis(20))]
#[case(BackoffConfig::default(), Duration::from_millis(800), Duration::from_secs(1))]
#[case(
    BackoffConfig { initial_delay: Duration::from_millis(3), max_delay: Duration::from_millis(4) },
    Duration::from_millis(3),
    Duration::from_millis(4),
)]
fn next_delay_doubles_up_to_the_cap(
    #[case] backoff: BackoffConfig,
    #[case] current: Duration,
    #[case] expected: Duration,
) {
    assert_eq!(backoff.next(current), expected);
}
