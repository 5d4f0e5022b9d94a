//! Desktop host wiring
//!
//! Hosts without Android services: capture goes to WAV files through a
//! push tap, keep-alive is tracked in process, and permission grants are
//! reported by the host over the bridge.

use std::sync::Arc;

use crate::bridge::Platform;
use crate::capture::{CaptureInput, WavCaptureBackend, WavCaptureConfig};
use crate::config::Config;
use crate::keepalive::ProcessKeepAlive;
use crate::permissions::{PermissionSet, StaticPermissions};
use crate::server::CommandLauncher;

pub struct DesktopPlatform {
    pub platform: Platform,
    pub capture: CaptureInput,
    pub permissions: Arc<StaticPermissions>,
    pub keep_alive: Arc<ProcessKeepAlive>,
}

impl DesktopPlatform {
    pub fn new(config: &Config) -> Self {
        let capture = CaptureInput::new();
        let backend = WavCaptureBackend::new(
            WavCaptureConfig {
                sample_rate: config.recording.sample_rate,
                channels: config.recording.channels,
                ..WavCaptureConfig::default()
            },
            capture.clone(),
        );

        let initial = if config.recording.assume_permissions_granted {
            PermissionSet::all_granted()
        } else {
            PermissionSet::default()
        };
        let permissions = Arc::new(StaticPermissions::new(initial));
        let keep_alive = Arc::new(ProcessKeepAlive::new());

        let platform = Platform {
            capture: Box::new(backend),
            permissions: permissions.clone(),
            keep_alive: keep_alive.clone(),
            server: Arc::new(CommandLauncher::new(config.server.clone())),
        };

        Self {
            platform,
            capture,
            permissions,
            keep_alive,
        }
    }
}
