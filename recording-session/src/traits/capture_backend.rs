use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::models::error::CaptureError;
use crate::models::settings::CaptureSettings;

/// Asynchronous signals raised by a capture handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureEvent {
    /// Capture completed, either because `stop` was called or because the
    /// backend ended it on its own.
    Finished { success: bool },

    /// The encoder failed while capture was running.
    EncodeError(CaptureError),
}

/// Callback a capture handle uses to deliver its events.
///
/// May be invoked from any thread, including from inside `CaptureHandle::stop`.
pub type CaptureEventCallback = Arc<dyn Fn(CaptureEvent) + Send + Sync + 'static>;

/// Factory for platform capture handles.
pub trait CaptureBackend: Send + Sync {
    type Handle: CaptureHandle;

    /// Bind a new handle to `destination` with `settings`.
    ///
    /// `events` must receive exactly one `Finished` for every handle that is
    /// stopped, whether the stop came from `CaptureHandle::stop` or from the
    /// backend itself.
    fn construct(
        &self,
        destination: &Path,
        settings: &CaptureSettings,
        events: CaptureEventCallback,
    ) -> Result<Self::Handle, CaptureError>;
}

/// An active audio-capture binding to a destination.
///
/// Dropping the handle releases it.
pub trait CaptureHandle: Send + 'static {
    /// Allocate whatever the backend needs before the first `record`.
    fn prepare(&mut self) -> Result<(), CaptureError> {
        Ok(())
    }

    /// Begin or resume capture.
    fn record(&mut self) -> Result<(), CaptureError>;

    fn pause(&mut self);

    /// Stop capture and finalize the destination. Triggers `Finished`.
    fn stop(&mut self);

    /// Whether the backend is actively capturing right now.
    fn is_recording(&self) -> bool;

    /// Capture time accumulated so far, excluding pauses.
    fn elapsed(&self) -> Duration;
}
