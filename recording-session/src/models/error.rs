use thiserror::Error;

use super::state::SessionState;

/// Failures reported by the capture capability.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("permission denied")]
    PermissionDenied,

    #[error("device not available")]
    DeviceNotAvailable,

    #[error("destination unavailable: {0}")]
    Destination(String),

    #[error("unsupported settings: {0}")]
    UnsupportedSettings(String),

    #[error("encoding failed: {0}")]
    EncodingFailed(String),

    #[error("unknown error: {0}")]
    Unknown(String),
}

/// Failures reported by the audio-route capability.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RouteError {
    #[error("failed to set route mode: {0}")]
    SetMode(String),

    #[error("failed to activate route: {0}")]
    Activate(String),
}

/// Why `load` did not produce a usable capture handle.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LoadError {
    #[error("invalid capture settings: {0}")]
    InvalidSettings(String),

    #[error("cannot load while {0}")]
    InvalidState(SessionState),

    #[error("failed to construct capture handle: {0}")]
    Construction(CaptureError),

    #[error("failed to prepare capture handle: {0}")]
    Prepare(CaptureError),

    #[error("audio route unavailable: {0}")]
    Route(#[from] RouteError),
}

/// Failures that happen after a handle has been loaded.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    #[error("capture finished unsuccessfully")]
    CompletionFailed,

    #[error("encoding error during capture: {0}")]
    Encoding(CaptureError),

    #[error("failed to start capture: {0}")]
    Record(CaptureError),

    #[error("progress ticker unavailable: {0}")]
    Ticker(String),
}

/// Every error a session reports, either to its listener or from its constructor.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    #[error("invalid session configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to spawn thread: {0}")]
    Thread(String),
}

impl SessionError {
    pub fn is_load(&self) -> bool {
        matches!(self, Self::Load(_))
    }

    pub fn is_runtime(&self) -> bool {
        matches!(self, Self::Runtime(_))
    }
}
