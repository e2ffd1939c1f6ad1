//! Metric helpers for `wiresession`.
//!
//! This module defines metric names and simple helper functions wrapping the
//! [`metrics`](https://docs.rs/metrics) crate. Without the `metrics` feature
//! the helpers compile to no-ops.

#[cfg(feature = "metrics")]
use metrics::{counter, gauge};

/// Name of the gauge tracking live sessions.
pub const SESSIONS_ACTIVE: &str = "wiresession_sessions_active";
/// Name of the counter tracking processed frames.
pub const FRAMES_PROCESSED: &str = "wiresession_frames_processed_total";
/// Name of the counter tracking error occurrences.
pub const ERRORS_TOTAL: &str = "wiresession_errors_total";
/// Name of the counter tracking buffers returned to the pool.
pub const BUFFERS_RECYCLED: &str = "wiresession_buffers_recycled_total";
/// Name of the counter tracking buffers the pool gave up on.
pub const BUFFERS_DROPPED: &str = "wiresession_buffers_dropped_total";
/// Name of the counter tracking panicking connection tasks.
pub const CONNECTION_PANICS: &str = "wiresession_connection_panics_total";

/// Direction of frame processing.
#[derive(Clone, Copy, Debug)]
pub enum Direction {
    /// Frames read from a peer.
    Inbound,
    /// Frames written to a peer.
    Outbound,
}

impl Direction {
    #[cfg_attr(not(feature = "metrics"), allow(dead_code))]
    fn as_str(self) -> &'static str {
        match self {
            Direction::Inbound => "inbound",
            Direction::Outbound => "outbound",
        }
    }
}

/// Why the pool discarded a buffer instead of recycling it.
#[derive(Clone, Copy, Debug)]
pub enum DropReason {
    /// The reclamation queue was full.
    QueueFull,
    /// The buffer was still in use when its quiescence wait timed out.
    StillInUse,
}

impl DropReason {
    #[cfg_attr(not(feature = "metrics"), allow(dead_code))]
    fn as_str(self) -> &'static str {
        match self {
            DropReason::QueueFull => "queue_full",
            DropReason::StillInUse => "still_in_use",
        }
    }
}

/// Increment the live sessions gauge.
pub fn inc_sessions() {
    #[cfg(feature = "metrics")]
    gauge!(SESSIONS_ACTIVE).increment(1.0);
}

/// Decrement the live sessions gauge.
pub fn dec_sessions() {
    #[cfg(feature = "metrics")]
    gauge!(SESSIONS_ACTIVE).decrement(1.0);
}

/// Record a processed frame for the given direction.
pub fn inc_frames(direction: Direction) {
    #[cfg(feature = "metrics")]
    counter!(FRAMES_PROCESSED, "direction" => direction.as_str()).increment(1);
    #[cfg(not(feature = "metrics"))]
    let _ = direction;
}

/// Record an error occurrence.
pub fn inc_errors() {
    #[cfg(feature = "metrics")]
    counter!(ERRORS_TOTAL).increment(1);
}

/// Record a buffer deposited back into the pool.
pub fn inc_buffers_recycled() {
    #[cfg(feature = "metrics")]
    counter!(BUFFERS_RECYCLED).increment(1);
}

/// Record a buffer the pool discarded.
pub fn inc_buffers_dropped(reason: DropReason) {
    #[cfg(feature = "metrics")]
    counter!(BUFFERS_DROPPED, "reason" => reason.as_str()).increment(1);
    #[cfg(not(feature = "metrics"))]
    let _ = reason;
}

/// Record a panicking connection task.
pub fn inc_connection_panics() {
    #[cfg(feature = "metrics")]
    counter!(CONNECTION_PANICS).increment(1);
}
