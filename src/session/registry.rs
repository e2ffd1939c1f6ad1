//! Registry of live sessions.
//!
//! `SessionRegistry` stores non-owning weak references to session state so
//! a service can reach every live connection without keeping finished
//! sessions alive. Dead entries are pruned opportunistically or lazily at
//! lookup time.
use std::sync::Weak;

use dashmap::DashMap;

use super::{SessionHandle, SessionId, handle::SessionShared};

/// Concurrent registry of session handles keyed by [`SessionId`].
#[derive(Default)]
pub struct SessionRegistry(DashMap<SessionId, Weak<SessionShared>>);

impl SessionRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Retrieve the handle for `id` if the session is still alive.
    pub fn get(&self, id: &SessionId) -> Option<SessionHandle> {
        let guard = self.0.get(id);
        let handle = guard.as_ref().and_then(|weak| weak.upgrade());
        drop(guard);
        if handle.is_none() {
            self.0.remove_if(id, |_, weak| weak.strong_count() == 0);
        }
        handle.map(SessionHandle::from_arc)
    }

    /// Track a newly started session.
    pub fn insert(&self, handle: &SessionHandle) { self.0.insert(handle.id(), handle.downgrade()); }

    /// Forget a session, typically on teardown.
    pub fn remove(&self, id: &SessionId) { self.0.remove(id); }

    /// Remove all stale weak references.
    pub fn prune(&self) { self.0.retain(|_, weak| weak.strong_count() > 0); }

    /// Number of tracked entries, including any not yet pruned.
    #[must_use]
    pub fn len(&self) -> usize { self.0.len() }

    /// Returns `true` if nothing is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    /// Prune stale entries, then collect handles to the live sessions.
    #[must_use]
    pub fn active_handles(&self) -> Vec<SessionHandle> {
        let mut handles = Vec::with_capacity(self.0.len());
        self.0.retain(|_, weak| {
            if let Some(inner) = weak.upgrade() {
                handles.push(SessionHandle::from_arc(inner));
                true
            } else {
                false
            }
        });
        handles
    }

    /// Ask every live session to quit, returning how many were signalled.
    pub fn quit_all(&self) -> usize {
        let handles = self.active_handles();
        for handle in &handles {
            handle.quit();
        }
        handles.len()
    }
}
