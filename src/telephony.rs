//! Call state monitoring
//!
//! Turns the OS telephony callback stream into start/stop requests for the
//! recording controller. The monitor itself holds no recording state; the
//! caller passes in whether a session is currently active.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Telephony call state as reported by the OS
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CallState {
    /// No call in progress
    #[default]
    Idle,
    /// Incoming call, not yet answered
    Ringing,
    /// Call answered or outgoing call dialed
    Offhook,
}

impl fmt::Display for CallState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CallState::Idle => "IDLE",
            CallState::Ringing => "RINGING",
            CallState::Offhook => "OFFHOOK",
        };
        f.write_str(name)
    }
}

impl FromStr for CallState {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "IDLE" => Ok(CallState::Idle),
            "RINGING" => Ok(CallState::Ringing),
            "OFFHOOK" => Ok(CallState::Offhook),
            other => anyhow::bail!("Unknown call state: {}", other),
        }
    }
}

/// What the controller should do in response to a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallAction {
    StartRecording,
    StopRecording,
}

#[derive(Debug, Default)]
pub struct CallStateMonitor {
    state: CallState,
}

impl CallStateMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> CallState {
        self.state
    }

    /// Apply a call state notification
    pub fn on_call_state(&mut self, next: CallState, session_active: bool) -> Option<CallAction> {
        let previous = self.state;
        self.state = next;

        debug!("Call state {} -> {}", previous, next);

        match (previous, next) {
            (CallState::Idle | CallState::Ringing, CallState::Offhook) if !session_active => {
                Some(CallAction::StartRecording)
            }
            // Any hangup ends the session, including after a waiting call rang
            (_, CallState::Idle) if session_active => Some(CallAction::StopRecording),
            _ => None,
        }
    }
}
