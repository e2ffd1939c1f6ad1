//! One pooled buffer written by several sessions, then recycled.

use std::time::Duration;

use rstest::rstest;
use tokio::time::timeout;
use wiresession::{BufferPool, SessionHooks, SessionId, WriteSession};
use wiresession_testing::{FakeConnection, frame_bytes};

#[rstest]
#[case(1)]
#[case(3)]
#[tokio::test]
async fn shared_buffer_returns_to_the_pool_after_every_write(#[case] fan_out: u64) {
    let pool = BufferPool::new(1, 4);
    let (buf, from_pool) = pool.get();
    assert!(from_pool);
    buf.extend_from_slice(&frame_bytes(b"broadcast"));

    let mut conns = Vec::new();
    let mut runs = Vec::new();
    let mut handles = Vec::new();
    for id in 0..fan_out {
        let conn = FakeConnection::new();
        let session = WriteSession::new(SessionId::new(id), conn.clone(), 8);
        handles.push(session.handle());
        runs.push(tokio::spawn(session.run(SessionHooks::new())));
        conns.push(conn);
    }
    for handle in &handles {
        handle.send(buf.clone()).await.expect("send");
    }
    pool.put(buf.clone(), from_pool);

    timeout(Duration::from_secs(2), async {
        while pool.idle_len() == 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("buffer recycled once every session wrote it");
    assert_eq!(buf.pending(), 0);
    for conn in &conns {
        assert_eq!(conn.written(), frame_bytes(b"broadcast"));
    }

    let (again, from_pool) = pool.get();
    assert!(from_pool);
    assert!(again.ptr_eq(&buf));
    assert!(again.is_empty());

    for handle in &handles {
        handle.quit();
    }
    for run in runs {
        run.await.expect("session task");
    }
}
