use std::sync::atomic::{AtomicU8, Ordering};

/// Lifecycle of a session.
///
/// Transitions only move forward:
/// `Created → Running → Draining → Closed`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum SessionState {
    /// Constructed but the loops have not started.
    Created = 0,
    /// Both loops are running.
    Running = 1,
    /// The closed flag has been observed and the loops are winding down.
    Draining = 2,
    /// The connection is closed and both loops have ended.
    Closed = 3,
}

impl SessionState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => Self::Created,
            1 => Self::Running,
            2 => Self::Draining,
            _ => Self::Closed,
        }
    }
}

#[derive(Debug)]
pub(super) struct AtomicState(AtomicU8);

impl AtomicState {
    pub(super) fn new() -> Self { Self(AtomicU8::new(SessionState::Created as u8)) }

    pub(super) fn load(&self) -> SessionState { SessionState::from_u8(self.0.load(Ordering::Acquire)) }

    /// Move to `next` unless the state is already at or past it.
    pub(super) fn advance(&self, next: SessionState) {
        self.0.fetch_max(next as u8, Ordering::AcqRel);
    }
}
