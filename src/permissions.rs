use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// OS capability required before a call can be recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Permission {
    RecordAudio,
    ReadPhoneState,
    WriteStorage,
}

impl Permission {
    /// Every capability a recording session needs
    pub const REQUIRED: [Permission; 3] = [
        Permission::RecordAudio,
        Permission::ReadPhoneState,
        Permission::WriteStorage,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::RecordAudio => "RECORD_AUDIO",
            Permission::ReadPhoneState => "READ_PHONE_STATE",
            Permission::WriteStorage => "WRITE_STORAGE",
        }
    }
}

/// Snapshot of granted capabilities
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionSet {
    pub record_audio: bool,
    pub read_phone_state: bool,
    pub write_storage: bool,
}

impl PermissionSet {
    pub fn all_granted() -> Self {
        Self {
            record_audio: true,
            read_phone_state: true,
            write_storage: true,
        }
    }

    pub fn is_granted(&self, permission: Permission) -> bool {
        match permission {
            Permission::RecordAudio => self.record_audio,
            Permission::ReadPhoneState => self.read_phone_state,
            Permission::WriteStorage => self.write_storage,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.missing().is_empty()
    }

    pub fn missing(&self) -> Vec<Permission> {
        Permission::REQUIRED
            .into_iter()
            .filter(|p| !self.is_granted(*p))
            .collect()
    }
}

/// Platform permission API
///
/// `request` only fires the OS flow; the outcome arrives later as a
/// permission-result message on the recorder handle.
pub trait PermissionProvider: Send + Sync {
    fn current(&self) -> PermissionSet;

    fn request(&self, permissions: &[Permission]);
}

/// Checks capabilities before every session start
#[derive(Clone)]
pub struct PermissionGate {
    provider: Arc<dyn PermissionProvider>,
}

impl PermissionGate {
    pub fn new(provider: Arc<dyn PermissionProvider>) -> Self {
        Self { provider }
    }

    pub fn check_permissions(&self) -> bool {
        self.provider.current().is_complete()
    }

    /// Capabilities currently missing, revalidated on every call
    pub fn missing(&self) -> Vec<Permission> {
        self.provider.current().missing()
    }

    pub fn request_permissions(&self) {
        let missing = self.missing();
        let requested: Vec<Permission> = if missing.is_empty() {
            Permission::REQUIRED.to_vec()
        } else {
            missing
        };

        info!(
            "Requesting permissions: {}",
            requested
                .iter()
                .map(|p| p.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
        self.provider.request(&requested);
    }
}

/// Provider with a fixed, externally updated grant state
///
/// Used where the hosting platform reports grants out of process (the
/// HTTP bridge) rather than through a synchronous OS query.
#[derive(Default)]
pub struct StaticPermissions {
    granted: std::sync::Mutex<PermissionSet>,
}

impl StaticPermissions {
    pub fn new(granted: PermissionSet) -> Self {
        Self {
            granted: std::sync::Mutex::new(granted),
        }
    }

    pub fn set(&self, granted: PermissionSet) {
        if let Ok(mut current) = self.granted.lock() {
            *current = granted;
        }
    }
}

impl PermissionProvider for StaticPermissions {
    fn current(&self) -> PermissionSet {
        self.granted.lock().map(|g| *g).unwrap_or_default()
    }

    fn request(&self, permissions: &[Permission]) {
        info!(
            "Permission request forwarded to host for {} capabilities",
            permissions.len()
        );
    }
}
