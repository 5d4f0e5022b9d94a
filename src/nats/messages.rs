use serde::{Deserialize, Serialize};

use crate::events::EventEnvelope;

/// Recorder event as published to NATS
#[derive(Debug, Serialize, Deserialize)]
pub struct EventMessage {
    pub event: String,
    pub data: serde_json::Value, // Event payload, null for bare signals
    pub timestamp: String,       // RFC3339 timestamp
}

impl From<&EventEnvelope> for EventMessage {
    fn from(envelope: &EventEnvelope) -> Self {
        let data = serde_json::to_value(&envelope.event)
            .ok()
            .and_then(|mut value| value.get_mut("data").map(serde_json::Value::take))
            .unwrap_or(serde_json::Value::Null);

        Self {
            event: envelope.event.name().to_string(),
            data,
            timestamp: envelope.timestamp.to_rfc3339(),
        }
    }
}
