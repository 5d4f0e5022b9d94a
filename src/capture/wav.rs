// WAV capture backend: writes PCM frames pushed through a `CaptureInput` tap

use anyhow::{bail, Context, Result};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::backend::{AudioFrame, CaptureBackend, CaptureSummary};

/// Shared entry point for audio frames produced by the platform
///
/// Holds a sender only while a capture handle is open.
#[derive(Clone, Default)]
pub struct CaptureInput {
    sender: Arc<Mutex<Option<mpsc::Sender<AudioFrame>>>>,
}

impl CaptureInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a frame into the open capture handle
    ///
    /// Returns `false` when nothing is recording.
    pub async fn push(&self, frame: AudioFrame) -> Result<bool> {
        let sender = {
            let guard = self.sender.lock().await;
            guard.clone()
        };

        match sender {
            Some(tx) => {
                tx.send(frame)
                    .await
                    .context("Capture writer is gone")?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub async fn is_open(&self) -> bool {
        self.sender.lock().await.is_some()
    }

    async fn attach(&self, tx: mpsc::Sender<AudioFrame>) {
        *self.sender.lock().await = Some(tx);
    }

    async fn detach(&self) {
        self.sender.lock().await.take();
    }
}

/// Format of the PCM stream accepted by the backend
#[derive(Debug, Clone)]
pub struct WavCaptureConfig {
    pub sample_rate: u32,
    pub channels: u16,
    /// Frames buffered between the tap and the writer task
    pub buffer_frames: usize,
}

impl Default for WavCaptureConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16000,
            channels: 1,
            buffer_frames: 100,
        }
    }
}

pub struct WavCaptureBackend {
    config: WavCaptureConfig,
    input: CaptureInput,
    output_path: Option<PathBuf>,
    writer_task: Option<JoinHandle<Result<usize>>>,
}

impl WavCaptureBackend {
    pub fn new(config: WavCaptureConfig, input: CaptureInput) -> Self {
        info!(
            "WAV capture backend initialized ({}Hz, {} channels)",
            config.sample_rate, config.channels
        );

        Self {
            config,
            input,
            output_path: None,
            writer_task: None,
        }
    }

    async fn close_writer(&mut self) -> Result<usize> {
        self.input.detach().await;

        match self.writer_task.take() {
            Some(task) => task.await.context("Capture writer task panicked")?,
            None => Ok(0),
        }
    }
}

#[async_trait::async_trait]
impl CaptureBackend for WavCaptureBackend {
    async fn open(&mut self, output_path: &Path) -> Result<()> {
        if self.writer_task.is_some() {
            bail!("Already capturing");
        }

        info!("Opening WAV capture: {}", output_path.display());

        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create output directory {:?}", parent))?;
        }

        let spec = hound::WavSpec {
            channels: self.config.channels,
            sample_rate: self.config.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        // Never truncate an existing recording
        let file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(output_path)
            .with_context(|| format!("Failed to create WAV file: {:?}", output_path))?;
        let writer = hound::WavWriter::new(BufWriter::new(file), spec)
            .with_context(|| format!("Failed to write WAV header: {:?}", output_path))?;

        let (tx, rx) = mpsc::channel(self.config.buffer_frames);
        let expected = (self.config.sample_rate, self.config.channels);

        self.writer_task = Some(tokio::spawn(write_frames(writer, rx, expected)));
        self.input.attach(tx).await;
        self.output_path = Some(output_path.to_path_buf());

        info!("WAV capture started");

        Ok(())
    }

    async fn finalize(&mut self) -> Result<CaptureSummary> {
        let output_path = match self.output_path.take() {
            Some(path) => path,
            None => bail!("No capture handle open"),
        };

        info!("Finalizing WAV capture: {}", output_path.display());

        let sample_count = self.close_writer().await?;

        Ok(CaptureSummary {
            output_path,
            sample_count,
        })
    }

    async fn release(&mut self) {
        if let Err(e) = self.close_writer().await {
            error!("Failed to release capture handle: {:#}", e);
        }
        self.output_path = None;
    }

    fn is_capturing(&self) -> bool {
        self.writer_task.is_some()
    }

    fn extension(&self) -> &str {
        "wav"
    }

    fn name(&self) -> &str {
        "WAV file"
    }
}

async fn write_frames(
    mut writer: hound::WavWriter<BufWriter<File>>,
    mut rx: mpsc::Receiver<AudioFrame>,
    expected: (u32, u16),
) -> Result<usize> {
    let mut sample_count = 0;

    while let Some(frame) = rx.recv().await {
        if (frame.sample_rate, frame.channels) != expected {
            warn!(
                "Dropping frame with format {}Hz/{}ch (expected {}Hz/{}ch)",
                frame.sample_rate, frame.channels, expected.0, expected.1
            );
            continue;
        }

        for &sample in &frame.samples {
            writer
                .write_sample(sample)
                .context("Failed to write sample to WAV")?;
        }
        sample_count += frame.samples.len();
    }

    writer.finalize().context("Failed to finalize WAV file")?;

    Ok(sample_count)
}
