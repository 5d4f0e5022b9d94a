use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Lifecycle state of a recording session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// Capture handle open and writing
    Recording,
    /// Capture handle released and output finalized
    Stopped,
}

/// A single call recording
///
/// Owned by the recorder controller; never shared across tasks.
#[derive(Debug, Clone)]
pub struct RecordingSession {
    id: String,
    started_at: DateTime<Utc>,
    output_path: PathBuf,
    state: SessionState,
}

impl RecordingSession {
    pub fn new(started_at: DateTime<Utc>, output_path: PathBuf) -> Self {
        Self {
            id: format!("call-{}", uuid::Uuid::new_v4()),
            started_at,
            output_path,
            state: SessionState::Recording,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Mark stopped and return the elapsed seconds
    pub fn finish(&mut self) -> f64 {
        self.state = SessionState::Stopped;
        self.duration_secs()
    }

    pub fn duration_secs(&self) -> f64 {
        let duration = Utc::now().signed_duration_since(self.started_at);
        duration.num_milliseconds().max(0) as f64 / 1000.0
    }

    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            id: self.id.clone(),
            state: self.state,
            started_at: self.started_at,
            output_path: self.output_path.display().to_string(),
            duration_secs: self.duration_secs(),
        }
    }
}

/// Point-in-time view of a session for status queries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStatus {
    pub id: String,
    pub state: SessionState,
    pub started_at: DateTime<Utc>,
    pub output_path: String,
    pub duration_secs: f64,
}
