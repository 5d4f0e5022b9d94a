pub mod bridge;
pub mod capture;
pub mod config;
pub mod error;
pub mod events;
pub mod http;
pub mod keepalive;
pub mod monitor;
pub mod nats;
pub mod permissions;
pub mod platform;
pub mod recorder;
pub mod server;
pub mod session;
pub mod telephony;

pub use bridge::{CallRecorderBridge, Platform};
pub use capture::{AudioFrame, CaptureBackend, CaptureInput, CaptureSummary, WavCaptureBackend};
pub use config::Config;
pub use error::{BridgeRejection, RecorderError, RecorderResult};
pub use events::{EventEmitter, EventEnvelope, RecorderEvent};
pub use http::{create_router, AppState};
pub use keepalive::{ForegroundNotification, ForegroundSessionKeeper, KeepAlive, ProcessKeepAlive};
pub use monitor::BackgroundMonitor;
pub use nats::{EventMessage, EventPublisher};
pub use permissions::{Permission, PermissionGate, PermissionProvider, PermissionSet};
pub use platform::DesktopPlatform;
pub use recorder::{RecorderHandle, RecorderStatus, StartOutcome};
pub use server::{ServerLauncher, ServerSupervisor};
pub use session::{RecordingSession, SessionState};
pub use telephony::{CallAction, CallState, CallStateMonitor};
