use anyhow::Result;
use std::path::{Path, PathBuf};

/// Audio sample data (16-bit PCM, interleaved)
#[derive(Debug, Clone)]
pub struct AudioFrame {
    /// Raw audio samples (i16 PCM, interleaved)
    pub samples: Vec<i16>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels
    pub channels: u16,
}

impl AudioFrame {
    /// Decode little-endian PCM bytes as pushed by the platform audio callback
    pub fn from_le_bytes(bytes: &[u8], sample_rate: u32, channels: u16) -> Self {
        let samples = bytes
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
            .collect();

        Self {
            samples,
            sample_rate,
            channels,
        }
    }
}

/// Result of closing a capture handle
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureSummary {
    pub output_path: PathBuf,
    pub sample_count: usize,
}

/// Capture device seam
///
/// Platform-specific implementations:
/// - Android: MediaRecorder on the voice-communication source
/// - Desktop: `WavCaptureBackend`, fed through a `CaptureInput` tap
#[async_trait::async_trait]
pub trait CaptureBackend: Send + Sync {
    /// Open and prepare the device, writing to `output_path`
    async fn open(&mut self, output_path: &Path) -> Result<()>;

    /// Stop capturing, finalize the output file and release the handle
    async fn finalize(&mut self) -> Result<CaptureSummary>;

    /// Release the handle without finalizing; used on teardown
    async fn release(&mut self);

    /// Check if a capture handle is currently open
    fn is_capturing(&self) -> bool;

    /// File extension for the container this backend writes
    fn extension(&self) -> &str;

    /// Get backend name for logging
    fn name(&self) -> &str;
}
