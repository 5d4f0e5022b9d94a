//! Background voice monitoring service
//!
//! Separate from call recording: it only holds its own keep-alive and
//! signals the client to start or stop its own audio capture.

use anyhow::Result;
use tokio::sync::Mutex;
use tracing::info;

use crate::events::{EventEmitter, RecorderEvent};
use crate::keepalive::ForegroundSessionKeeper;

struct MonitorState {
    active: bool,
    keeper: ForegroundSessionKeeper,
}

pub struct BackgroundMonitor {
    state: Mutex<MonitorState>,
    events: EventEmitter,
}

impl BackgroundMonitor {
    pub fn new(keeper: ForegroundSessionKeeper, events: EventEmitter) -> Self {
        Self {
            state: Mutex::new(MonitorState {
                active: false,
                keeper,
            }),
            events,
        }
    }

    /// Returns `false` if monitoring was already running
    pub async fn start(&self) -> Result<bool> {
        let mut state = self.state.lock().await;
        if state.active {
            return Ok(false);
        }

        state.keeper.engage()?;
        state.active = true;

        info!("Background monitoring started");
        self.events.emit(RecorderEvent::StartBackgroundRecording);

        Ok(true)
    }

    /// Returns `false` if monitoring was not running
    pub async fn stop(&self) -> bool {
        let mut state = self.state.lock().await;
        if !state.active {
            return false;
        }

        state.keeper.release();
        state.active = false;

        info!("Background monitoring stopped");
        self.events.emit(RecorderEvent::StopBackgroundRecording);

        true
    }

    pub async fn is_active(&self) -> bool {
        self.state.lock().await.active
    }
}
