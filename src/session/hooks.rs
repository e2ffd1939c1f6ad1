use std::fmt;

use super::SessionHandle;

type Callback = Box<dyn FnOnce(&SessionHandle) + Send>;

/// Optional lifecycle callbacks for a session run.
///
/// `on_new_session` runs once both loops have started. `on_quit_session`
/// runs once both loops have ended and the connection is closed. Each runs
/// at most once.
#[derive(Default)]
pub struct SessionHooks {
    pub(super) on_new: Option<Callback>,
    pub(super) on_quit: Option<Callback>,
}

impl SessionHooks {
    /// No callbacks.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Run `f` once the session is fully started.
    #[must_use]
    pub fn on_new_session(mut self, f: impl FnOnce(&SessionHandle) + Send + 'static) -> Self {
        self.on_new = Some(Box::new(f));
        self
    }

    /// Run `f` once the session is fully torn down.
    #[must_use]
    pub fn on_quit_session(mut self, f: impl FnOnce(&SessionHandle) + Send + 'static) -> Self {
        self.on_quit = Some(Box::new(f));
        self
    }
}

impl fmt::Debug for SessionHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionHooks")
            .field("on_new_session", &self.on_new.is_some())
            .field("on_quit_session", &self.on_quit.is_some())
            .finish()
    }
}
