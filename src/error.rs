//! Error kinds surfaced at the recorder's operation boundary
//!
//! Internal plumbing uses `anyhow`; anything that crosses the bridge is
//! converted into a `RecorderError` and then into a `BridgeRejection`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::permissions::Permission;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecorderError {
    /// Some capability is missing; a permission request has been fired
    #[error("Permission denied: missing {}", format_permissions(.0))]
    PermissionDenied(Vec<Permission>),

    /// The capture device could not be opened or prepared
    #[error("Capture device unavailable: {0}")]
    DeviceUnavailable(String),

    /// Foreground promotion or wake lock could not be obtained
    #[error("Keep-alive failed: {0}")]
    KeepAlive(String),

    /// The capture handle failed while finalizing the recording
    #[error("Failed to finalize recording: {0}")]
    Finalize(String),

    /// The controller task is no longer running
    #[error("Recorder controller is not running")]
    ControllerGone,
}

fn format_permissions(permissions: &[Permission]) -> String {
    permissions
        .iter()
        .map(|p| p.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

pub type RecorderResult<T> = Result<T, RecorderError>;

/// Rejected deferred result handed back to the bridge client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeRejection {
    pub code: String,
    pub message: String,
}

impl BridgeRejection {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for BridgeRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for BridgeRejection {}

impl From<RecorderError> for BridgeRejection {
    fn from(error: RecorderError) -> Self {
        let code = match &error {
            RecorderError::PermissionDenied(_) => "PERMISSION_DENIED",
            RecorderError::DeviceUnavailable(_) => "RECORDING_ERROR",
            RecorderError::KeepAlive(_) => "RECORDING_ERROR",
            RecorderError::Finalize(_) => "STOP_ERROR",
            RecorderError::ControllerGone => "INIT_ERROR",
        };

        BridgeRejection::new(code, error.to_string())
    }
}
