use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;

/// Lifecycle event relayed to the bridge client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum RecorderEvent {
    #[serde(rename = "onCallRecordingStarted")]
    Started { path: String },

    #[serde(rename = "onCallRecordingStopped")]
    Stopped { path: String, duration_secs: f64 },

    #[serde(rename = "onCallRecordingError")]
    Error { message: String },

    #[serde(rename = "onCallRecordingPermissionResult")]
    PermissionResult { granted: bool },

    #[serde(rename = "startBackgroundRecording")]
    StartBackgroundRecording,

    #[serde(rename = "stopBackgroundRecording")]
    StopBackgroundRecording,
}

impl RecorderEvent {
    /// Name the client subscribes to
    pub fn name(&self) -> &'static str {
        match self {
            RecorderEvent::Started { .. } => "onCallRecordingStarted",
            RecorderEvent::Stopped { .. } => "onCallRecordingStopped",
            RecorderEvent::Error { .. } => "onCallRecordingError",
            RecorderEvent::PermissionResult { .. } => "onCallRecordingPermissionResult",
            RecorderEvent::StartBackgroundRecording => "startBackgroundRecording",
            RecorderEvent::StopBackgroundRecording => "stopBackgroundRecording",
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        RecorderEvent::Error {
            message: message.into(),
        }
    }
}

/// An emitted event with its emission time
#[derive(Debug, Clone, Serialize)]
pub struct EventEnvelope {
    #[serde(flatten)]
    pub event: RecorderEvent,
    pub timestamp: DateTime<Utc>,
}

/// Fire-and-forget fan-out to every subscriber
#[derive(Clone)]
pub struct EventEmitter {
    tx: broadcast::Sender<EventEnvelope>,
}

impl EventEmitter {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn emit(&self, event: RecorderEvent) {
        debug!("Emitting {}", event.name());

        let envelope = EventEnvelope {
            event,
            timestamp: Utc::now(),
        };

        // No subscribers is not an error; nothing acknowledges events
        let _ = self.tx.send(envelope);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.tx.subscribe()
    }
}

impl Default for EventEmitter {
    fn default() -> Self {
        Self::new(64)
    }
}
