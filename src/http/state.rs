use crate::bridge::CallRecorderBridge;
use crate::capture::CaptureInput;
use crate::permissions::StaticPermissions;
use std::sync::Arc;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub bridge: Arc<CallRecorderBridge>,

    /// Entry point for PCM pushed by the host's audio callback
    pub capture: CaptureInput,

    /// Grant state reported by the host
    pub permissions: Arc<StaticPermissions>,

    /// PCM format of pushed frames
    pub sample_rate: u32,
    pub channels: u16,
}
