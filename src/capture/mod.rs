pub mod backend;
pub mod wav;

pub use backend::{AudioFrame, CaptureBackend, CaptureSummary};
pub use wav::{CaptureInput, WavCaptureBackend, WavCaptureConfig};
