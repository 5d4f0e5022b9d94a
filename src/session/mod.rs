//! Recording session data
//!
//! This module provides the `RecordingSession` record owned by the
//! controller and the file naming rules for call recordings.

mod naming;
mod session;

pub use naming::{is_recording_name, recording_path, TIMESTAMP_FORMAT};
pub use session::{RecordingSession, SessionState, SessionStatus};
