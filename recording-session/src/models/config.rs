use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::error::SessionError;

/// Audio-route mode applied by `load`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteMode {
    /// Simultaneous playback and capture.
    #[default]
    PlayAndRecord,
    /// Capture only.
    Record,
}

/// Configuration for a recording session.
///
/// Every field has a default, so a partial JSON document is enough:
/// ```text
/// { "progress_interval_ms": 500 }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Period of progress notifications while recording (default: 1000).
    pub progress_interval_ms: u64,

    /// Route mode requested from the audio-route capability (default: play-and-record).
    pub route_mode: RouteMode,

    /// Prefix for the names of the threads the session spawns.
    pub thread_label: String,
}

impl SessionConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.progress_interval_ms == 0 {
            return Err("progress interval must be positive".into());
        }
        if self.thread_label.trim().is_empty() {
            return Err("thread label must not be empty".into());
        }
        Ok(())
    }

    pub fn progress_interval(&self) -> Duration {
        Duration::from_millis(self.progress_interval_ms)
    }

    /// Parse and validate a JSON configuration document.
    pub fn from_json(json: &str) -> Result<Self, SessionError> {
        let config: SessionConfig = serde_json::from_str(json)
            .map_err(|e| SessionError::InvalidConfig(format!("failed to parse config: {}", e)))?;
        config.validate().map_err(SessionError::InvalidConfig)?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, SessionError> {
        let json = fs::read_to_string(path)
            .map_err(|e| SessionError::InvalidConfig(format!("failed to read config: {}", e)))?;
        Self::from_json(&json)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            progress_interval_ms: 1000,
            route_mode: RouteMode::PlayAndRecord,
            thread_label: "recording-session".into(),
        }
    }
}
