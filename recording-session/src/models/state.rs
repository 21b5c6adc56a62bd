use serde::{Deserialize, Serialize};

/// Recording session state machine.
///
/// State transitions:
/// ```text
/// idle → loaded → recording ↔ paused
///   ↑               ↓          ↓
///   │             stopped ←────┘
///   │               │
///   └── failed      └──→ loaded (reload)
/// ```
///
/// A failed `load` lands in `Failed`; `load` is accepted again from there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    #[default]
    Idle,
    Loaded,
    Recording,
    Paused,
    Stopped,
    Failed,
}

impl SessionState {
    /// States in which the session holds a capture handle.
    pub fn holds_handle(&self) -> bool {
        matches!(self, Self::Loaded | Self::Recording | Self::Paused)
    }

    /// States from which `load` is accepted.
    pub fn can_load(&self) -> bool {
        matches!(self, Self::Idle | Self::Stopped | Self::Failed)
    }

    pub fn can_start(&self) -> bool {
        matches!(self, Self::Loaded | Self::Paused)
    }

    pub fn can_pause(&self) -> bool {
        matches!(self, Self::Recording)
    }

    pub fn can_stop(&self) -> bool {
        matches!(self, Self::Recording | Self::Paused)
    }

    pub fn is_recording(&self) -> bool {
        matches!(self, Self::Recording)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loaded => "loaded",
            Self::Recording => "recording",
            Self::Paused => "paused",
            Self::Stopped => "stopped",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
