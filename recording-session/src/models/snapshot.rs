use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::state::SessionState;

/// Point-in-time view of a recording session, read under the session lock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub state: SessionState,
    pub destination: Option<PathBuf>,
    pub loaded_at: Option<DateTime<Utc>>,
    /// First `start` after the most recent `load`.
    pub started_at: Option<DateTime<Utc>>,
    pub elapsed_secs: Option<f64>,
    pub has_been_paused: bool,
    pub is_ticking: bool,
    pub last_error: Option<String>,
}
