//! Client-facing bridge
//!
//! Every operation resolves to a value or rejects with a
//! [`BridgeRejection`]; failures never escape as panics or raw errors.

use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::capture::CaptureBackend;
use crate::config::Config;
use crate::error::{BridgeRejection, RecorderError};
use crate::events::{EventEnvelope, EventEmitter, RecorderEvent};
use crate::keepalive::{ForegroundSessionKeeper, KeepAlive};
use crate::monitor::BackgroundMonitor;
use crate::permissions::{PermissionGate, PermissionProvider};
use crate::recorder::{RecorderHandle, RecorderParts, RecorderSettings, RecorderStatus};
use crate::server::{ServerLauncher, ServerSupervisor};
use crate::telephony::CallState;

/// Platform implementations of every capability seam
pub struct Platform {
    pub capture: Box<dyn CaptureBackend>,
    pub permissions: Arc<dyn PermissionProvider>,
    pub keep_alive: Arc<dyn KeepAlive>,
    pub server: Arc<dyn ServerLauncher>,
}

pub struct CallRecorderBridge {
    recorder: RecorderHandle,
    monitor: BackgroundMonitor,
    server: ServerSupervisor,
    events: EventEmitter,
}

impl CallRecorderBridge {
    /// Wire the platform into a running recorder
    ///
    /// Must be called inside a tokio runtime; the returned handle is the
    /// controller task.
    pub fn new(config: &Config, platform: Platform) -> (Self, JoinHandle<()>) {
        let events = EventEmitter::default();

        let call_keeper = ForegroundSessionKeeper::new(
            Arc::clone(&platform.keep_alive),
            config.keepalive.call_notification(),
            config.keepalive.call_wake_lock_tag.clone(),
        );
        let monitor_keeper = ForegroundSessionKeeper::new(
            platform.keep_alive,
            config.keepalive.monitor_notification(),
            config.keepalive.monitor_wake_lock_tag.clone(),
        );

        let (recorder, task) = RecorderHandle::spawn(RecorderParts {
            backend: platform.capture,
            permissions: PermissionGate::new(platform.permissions),
            keeper: call_keeper,
            events: events.clone(),
            settings: RecorderSettings {
                output_dir: config.recording.output_dir.clone(),
                file_prefix: config.recording.file_prefix.clone(),
            },
        });

        let bridge = Self {
            recorder,
            monitor: BackgroundMonitor::new(monitor_keeper, events.clone()),
            server: ServerSupervisor::new(platform.server),
            events,
        };

        (bridge, task)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.events.subscribe()
    }

    pub fn recorder(&self) -> &RecorderHandle {
        &self.recorder
    }

    pub async fn initialize(&self) -> Result<bool, BridgeRejection> {
        self.recorder.initialize().await.map_err(|e| self.reject(e))
    }

    /// Resolves `true` once a session is active, new or existing
    pub async fn start_recording(&self) -> Result<bool, BridgeRejection> {
        let outcome = self.recorder.start().await.map_err(|e| self.reject(e))?;
        info!("Recording active: {}", outcome.path().display());
        Ok(true)
    }

    pub async fn stop_recording(&self) -> Result<Option<String>, BridgeRejection> {
        let path = self.recorder.stop().await.map_err(|e| self.reject(e))?;
        Ok(path.map(|p| p.display().to_string()))
    }

    pub async fn status(&self) -> Result<RecorderStatus, BridgeRejection> {
        self.recorder.status().await.map_err(|e| self.reject(e))
    }

    pub async fn start_server(&self) -> Result<String, BridgeRejection> {
        self.server.start_if_needed().await.map_err(|e| {
            error!("Error starting server: {:#}", e);
            BridgeRejection::new("SERVER_ERROR", format!("Failed to start server: {:#}", e))
        })
    }

    pub fn is_server_running(&self) -> bool {
        self.server.is_running()
    }

    pub async fn start_background_monitoring(&self) -> Result<bool, BridgeRejection> {
        self.monitor.start().await.map_err(|e| {
            let message = format!("Failed to start background monitoring: {:#}", e);
            error!("{}", message);
            self.events.emit(RecorderEvent::error(message.clone()));
            BridgeRejection::new("RECORDING_ERROR", message)
        })
    }

    pub async fn stop_background_monitoring(&self) -> bool {
        self.monitor.stop().await
    }

    pub async fn is_monitoring(&self) -> bool {
        self.monitor.is_active().await
    }

    /// Telephony callback entry point
    pub async fn on_call_state_changed(&self, state: CallState) -> Result<(), BridgeRejection> {
        self.recorder
            .call_state_changed(state)
            .await
            .map_err(|e| self.reject(e))
    }

    /// Permission-request result entry point
    pub async fn on_permission_result(&self, granted: bool) -> Result<(), BridgeRejection> {
        self.recorder
            .permission_result(granted)
            .await
            .map_err(|e| self.reject(e))
    }

    /// Stop everything and release every held resource
    pub async fn shutdown(&self) {
        info!("Shutting down call recorder");

        self.monitor.stop().await;
        if let Err(e) = self.recorder.shutdown().await {
            error!("Recorder shutdown failed: {}", e);
        }
        self.server.shutdown().await;
    }

    /// Convert a recorder failure into a rejection
    ///
    /// The controller already emits an error event for failures it
    /// produces. A dead controller cannot, so that case is emitted here.
    fn reject(&self, err: RecorderError) -> BridgeRejection {
        if err == RecorderError::ControllerGone {
            error!("Recorder call failed: {}", err);
            self.events.emit(RecorderEvent::error(err.to_string()));
        }
        BridgeRejection::from(err)
    }
}
