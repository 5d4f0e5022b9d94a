//! Call recording lifecycle
//!
//! `RecorderHandle` is the cloneable front of a controller task that owns
//! the active session. Bridge calls, telephony callbacks and permission
//! results all become messages on the same queue.

mod controller;

pub use controller::{RecorderParts, RecorderSettings};

use serde::Serialize;
use std::path::PathBuf;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::error::{RecorderError, RecorderResult};
use crate::session::SessionStatus;
use crate::telephony::CallState;
use controller::{Command, RecorderController};

/// Result of a start request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartOutcome {
    /// A new session was opened at this path
    Started(PathBuf),
    /// A session was already active; nothing was allocated
    AlreadyActive(PathBuf),
}

impl StartOutcome {
    pub fn path(&self) -> &PathBuf {
        match self {
            StartOutcome::Started(path) | StartOutcome::AlreadyActive(path) => path,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RecorderStatus {
    pub active: bool,
    pub call_state: CallState,
    pub permissions_granted: bool,
    pub keep_alive_engaged: bool,
    pub session: Option<SessionStatus>,
}

#[derive(Clone)]
pub struct RecorderHandle {
    tx: mpsc::Sender<Command>,
}

impl RecorderHandle {
    /// Spawn the controller task on the current tokio runtime
    pub fn spawn(parts: RecorderParts) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(32);
        let controller = RecorderController::new(parts);
        let task = tokio::spawn(controller.run(rx));

        (Self { tx }, task)
    }

    /// Check permissions and request any that are missing
    pub async fn initialize(&self) -> RecorderResult<bool> {
        self.request(|reply| Command::Initialize { reply }).await
    }

    pub async fn start(&self) -> RecorderResult<StartOutcome> {
        self.request(|reply| Command::Start { reply }).await?
    }

    /// Stop the active session; `None` when nothing was recording
    pub async fn stop(&self) -> RecorderResult<Option<PathBuf>> {
        self.request(|reply| Command::Stop { reply }).await?
    }

    pub async fn status(&self) -> RecorderResult<RecorderStatus> {
        self.request(|reply| Command::Status { reply }).await
    }

    /// Deliver a telephony callback; processed in arrival order
    pub async fn call_state_changed(&self, state: CallState) -> RecorderResult<()> {
        self.send(Command::CallState(state)).await
    }

    /// Deliver the outcome of an earlier permission request
    pub async fn permission_result(&self, granted: bool) -> RecorderResult<()> {
        self.send(Command::PermissionResult(granted)).await
    }

    /// Stop any active session, release keep-alive resources and end the task
    pub async fn shutdown(&self) -> RecorderResult<()> {
        self.request(|reply| Command::Shutdown { reply }).await
    }

    async fn send(&self, command: Command) -> RecorderResult<()> {
        self.tx
            .send(command)
            .await
            .map_err(|_| RecorderError::ControllerGone)
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> RecorderResult<T> {
        let (reply, rx) = oneshot::channel();
        self.send(command(reply)).await?;
        rx.await.map_err(|_| RecorderError::ControllerGone)
    }
}
