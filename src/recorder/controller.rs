use chrono::{Local, Utc};
use std::path::PathBuf;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use crate::capture::CaptureBackend;
use crate::error::{RecorderError, RecorderResult};
use crate::events::{EventEmitter, RecorderEvent};
use crate::keepalive::ForegroundSessionKeeper;
use crate::permissions::PermissionGate;
use crate::session::{recording_path, RecordingSession};
use crate::telephony::{CallAction, CallState, CallStateMonitor};

use super::{RecorderStatus, StartOutcome};

/// Where recordings land and how they are named
#[derive(Debug, Clone)]
pub struct RecorderSettings {
    pub output_dir: PathBuf,
    pub file_prefix: String,
}

/// Collaborators owned by the controller task
pub struct RecorderParts {
    pub backend: Box<dyn CaptureBackend>,
    pub permissions: PermissionGate,
    pub keeper: ForegroundSessionKeeper,
    pub events: EventEmitter,
    pub settings: RecorderSettings,
}

pub(super) enum Command {
    Initialize {
        reply: oneshot::Sender<bool>,
    },
    Start {
        reply: oneshot::Sender<RecorderResult<StartOutcome>>,
    },
    Stop {
        reply: oneshot::Sender<RecorderResult<Option<PathBuf>>>,
    },
    CallState(CallState),
    PermissionResult(bool),
    Status {
        reply: oneshot::Sender<RecorderStatus>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

/// Single owner of the session, capture handle and keep-alive resources
///
/// Every mutation arrives as a `Command`, so bridge calls and telephony
/// callbacks from different threads never race each other.
pub(super) struct RecorderController {
    backend: Box<dyn CaptureBackend>,
    permissions: PermissionGate,
    keeper: ForegroundSessionKeeper,
    events: EventEmitter,
    settings: RecorderSettings,
    monitor: CallStateMonitor,
    session: Option<RecordingSession>,
}

impl RecorderController {
    pub(super) fn new(parts: RecorderParts) -> Self {
        Self {
            backend: parts.backend,
            permissions: parts.permissions,
            keeper: parts.keeper,
            events: parts.events,
            settings: parts.settings,
            monitor: CallStateMonitor::new(),
            session: None,
        }
    }

    pub(super) async fn run(mut self, mut commands: mpsc::Receiver<Command>) {
        info!("Recorder controller started ({} backend)", self.backend.name());

        while let Some(command) = commands.recv().await {
            match command {
                Command::Initialize { reply } => {
                    let _ = reply.send(self.initialize());
                }
                Command::Start { reply } => {
                    let _ = reply.send(self.start().await);
                }
                Command::Stop { reply } => {
                    let _ = reply.send(self.stop().await);
                }
                Command::CallState(state) => self.on_call_state(state).await,
                Command::PermissionResult(granted) => self.on_permission_result(granted),
                Command::Status { reply } => {
                    let _ = reply.send(self.status());
                }
                Command::Shutdown { reply } => {
                    self.teardown().await;
                    let _ = reply.send(());
                    info!("Recorder controller stopped");
                    return;
                }
            }
        }

        // Every handle dropped without an explicit shutdown
        self.teardown().await;
        info!("Recorder controller stopped");
    }

    fn initialize(&self) -> bool {
        if !self.permissions.check_permissions() {
            self.permissions.request_permissions();
        }
        true
    }

    async fn start(&mut self) -> RecorderResult<StartOutcome> {
        if let Some(session) = &self.session {
            warn!("Recording already started: {}", session.id());
            return Ok(StartOutcome::AlreadyActive(session.output_path().to_path_buf()));
        }

        let missing = self.permissions.missing();
        if !missing.is_empty() {
            self.permissions.request_permissions();
            return Err(self.fail(RecorderError::PermissionDenied(missing)));
        }

        let started_at = Local::now();
        let output_path = recording_path(
            &self.settings.output_dir,
            &self.settings.file_prefix,
            &started_at,
            self.backend.extension(),
        );

        if let Err(e) = self.keeper.engage() {
            return Err(self.fail(RecorderError::KeepAlive(format!("{:#}", e))));
        }

        if let Err(e) = self.backend.open(&output_path).await {
            self.keeper.release();
            return Err(self.fail(RecorderError::DeviceUnavailable(format!("{:#}", e))));
        }

        let session = RecordingSession::new(started_at.with_timezone(&Utc), output_path.clone());
        info!(
            "Recording session started: {} -> {}",
            session.id(),
            output_path.display()
        );
        self.session = Some(session);

        self.events.emit(RecorderEvent::Started {
            path: output_path.display().to_string(),
        });

        Ok(StartOutcome::Started(output_path))
    }

    async fn stop(&mut self) -> RecorderResult<Option<PathBuf>> {
        let Some(mut session) = self.session.take() else {
            debug!("Recording not active");
            return Ok(None);
        };

        info!("Stopping recording session: {}", session.id());

        let finalized = self.backend.finalize().await;
        self.keeper.release();
        let duration_secs = session.finish();

        match finalized {
            Ok(summary) => {
                info!(
                    "Recording session stopped: {} ({:.1}s, {} samples)",
                    session.id(),
                    duration_secs,
                    summary.sample_count
                );

                let path = session.output_path().to_path_buf();
                self.events.emit(RecorderEvent::Stopped {
                    path: path.display().to_string(),
                    duration_secs,
                });

                Ok(Some(path))
            }
            Err(e) => Err(self.fail(RecorderError::Finalize(format!("{:#}", e)))),
        }
    }

    async fn on_call_state(&mut self, state: CallState) {
        let action = self.monitor.on_call_state(state, self.session.is_some());

        match action {
            Some(CallAction::StartRecording) => {
                info!("Call connected, starting recording");
                if let Err(e) = self.start().await {
                    warn!("Call-triggered start failed: {}", e);
                }
            }
            Some(CallAction::StopRecording) => {
                info!("Call ended, stopping recording");
                if let Err(e) = self.stop().await {
                    warn!("Call-triggered stop failed: {}", e);
                }
            }
            None => {}
        }
    }

    fn on_permission_result(&self, granted: bool) {
        info!("Permission result delivered: granted={}", granted);

        self.events.emit(RecorderEvent::PermissionResult { granted });
        if !granted {
            self.events.emit(RecorderEvent::error("Permission denied"));
        }
    }

    fn status(&self) -> RecorderStatus {
        RecorderStatus {
            active: self.session.is_some(),
            call_state: self.monitor.state(),
            permissions_granted: self.permissions.check_permissions(),
            keep_alive_engaged: self.keeper.is_engaged(),
            session: self.session.as_ref().map(|s| s.status()),
        }
    }

    async fn teardown(&mut self) {
        if self.session.is_some() {
            if let Err(e) = self.stop().await {
                error!("Failed to stop recording on teardown: {}", e);
            }
        }

        if self.backend.is_capturing() {
            self.backend.release().await;
        }
        self.keeper.release();
    }

    /// Report an operation failure to subscribers before surfacing it
    fn fail(&self, err: RecorderError) -> RecorderError {
        error!("Recorder error: {}", err);
        self.events.emit(RecorderEvent::error(err.to_string()));
        err
    }
}
