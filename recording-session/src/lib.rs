//! # recording-session
//!
//! Platform-agnostic audio recording session.
//!
//! Wraps an opaque capture capability in a guarded state machine, drives a
//! once-per-second progress ticker while recording, and relays lifecycle and
//! error notifications to a weakly held listener. Platform backends implement
//! `CaptureBackend`/`CaptureHandle` and `AudioRoute` and plug into the generic
//! `RecordingSession`.
//!
//! ## Architecture
//!
//! ```text
//! recording-session (this crate)
//! ├── traits/    ← CaptureBackend, CaptureHandle, AudioRoute, SessionListener
//! ├── models/    ← SessionState, SessionError, SessionConfig, CaptureSettings, SessionSnapshot
//! └── session/   ← RecordingSession (state machine), ProgressTicker, dispatcher
//! ```
//!
//! ## Usage
//! ```ignore
//! use recording_session::{CaptureSettings, RecordingSession, SessionConfig};
//!
//! let session = RecordingSession::new(backend, route, SessionConfig::default())?;
//! session.set_listener(&listener);
//! session.load("take-1.m4a", &CaptureSettings::default())?;
//! session.start();
//! ```

pub mod models;
pub mod session;
pub mod traits;

#[cfg(test)]
mod testing;

// Re-export key types at crate root for convenience.
pub use models::config::{RouteMode, SessionConfig};
pub use models::error::{CaptureError, LoadError, RouteError, RuntimeError, SessionError};
pub use models::settings::{AudioFormat, CaptureSettings, EncoderQuality};
pub use models::snapshot::SessionSnapshot;
pub use models::state::SessionState;
pub use session::recording::RecordingSession;
pub use traits::audio_route::AudioRoute;
pub use traits::capture_backend::{
    CaptureBackend, CaptureEvent, CaptureEventCallback, CaptureHandle,
};
pub use traits::session_listener::SessionListener;
