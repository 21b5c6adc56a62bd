use std::time::Duration;

use crate::models::error::SessionError;

/// Observer for recording session notifications.
///
/// All methods are called from the session's dispatcher thread, one at a
/// time, never while the session's state lock is held. Implementations may
/// call back into the session.
///
/// The session only holds a weak reference; keep the listener alive yourself.
pub trait SessionListener: Send + Sync {
    /// Called once per capture handle when its completion signal fires.
    fn on_finished(&self, success: bool);

    /// Called once per ticker interval while recording.
    fn on_progress(&self, time: Duration);

    /// Called for every load or capture failure.
    fn on_error(&self, error: &SessionError);
}
