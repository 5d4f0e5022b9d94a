// Shared fakes for the platform seams

#![allow(dead_code)]

use anyhow::{bail, Result};
use call_recorder::capture::{CaptureBackend, CaptureSummary};
use call_recorder::events::{EventEnvelope, RecorderEvent};
use call_recorder::keepalive::{ForegroundSessionKeeper, ProcessKeepAlive};
use call_recorder::permissions::{Permission, PermissionGate, PermissionProvider, PermissionSet};
use call_recorder::recorder::{RecorderHandle, RecorderParts, RecorderSettings};
use call_recorder::{Config, EventEmitter};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// Capture backend that records what was asked of it
#[derive(Default)]
pub struct CaptureProbe {
    pub opens: AtomicUsize,
    pub finalizes: AtomicUsize,
    pub fail_open: AtomicBool,
    pub fail_finalize: AtomicBool,
    pub open_path: Mutex<Option<PathBuf>>,
}

pub struct FakeCapture {
    probe: Arc<CaptureProbe>,
    path: Option<PathBuf>,
}

impl FakeCapture {
    pub fn new(probe: Arc<CaptureProbe>) -> Self {
        Self { probe, path: None }
    }
}

#[async_trait::async_trait]
impl CaptureBackend for FakeCapture {
    async fn open(&mut self, output_path: &Path) -> Result<()> {
        if self.probe.fail_open.load(Ordering::SeqCst) {
            bail!("MediaRecorder prepare failed: device busy");
        }
        self.probe.opens.fetch_add(1, Ordering::SeqCst);
        *self.probe.open_path.lock().unwrap() = Some(output_path.to_path_buf());
        self.path = Some(output_path.to_path_buf());
        Ok(())
    }

    async fn finalize(&mut self) -> Result<CaptureSummary> {
        let path = self.path.take();
        *self.probe.open_path.lock().unwrap() = None;
        self.probe.finalizes.fetch_add(1, Ordering::SeqCst);

        if self.probe.fail_finalize.load(Ordering::SeqCst) {
            bail!("stop called in an invalid state");
        }

        Ok(CaptureSummary {
            output_path: path.unwrap_or_default(),
            sample_count: 1600,
        })
    }

    async fn release(&mut self) {
        self.path = None;
        *self.probe.open_path.lock().unwrap() = None;
    }

    fn is_capturing(&self) -> bool {
        self.path.is_some()
    }

    fn extension(&self) -> &str {
        "m4a"
    }

    fn name(&self) -> &str {
        "fake"
    }
}

/// Permission provider with a settable grant state and request counter
pub struct FakePermissions {
    pub granted: Mutex<PermissionSet>,
    pub requests: AtomicUsize,
    pub last_request: Mutex<Vec<Permission>>,
}

impl FakePermissions {
    pub fn new(granted: PermissionSet) -> Self {
        Self {
            granted: Mutex::new(granted),
            requests: AtomicUsize::new(0),
            last_request: Mutex::new(Vec::new()),
        }
    }

    pub fn set(&self, granted: PermissionSet) {
        *self.granted.lock().unwrap() = granted;
    }

    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

impl PermissionProvider for FakePermissions {
    fn current(&self) -> PermissionSet {
        *self.granted.lock().unwrap()
    }

    fn request(&self, permissions: &[Permission]) {
        self.requests.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = permissions.to_vec();
    }
}

pub struct Harness {
    pub recorder: RecorderHandle,
    pub task: JoinHandle<()>,
    pub events: broadcast::Receiver<EventEnvelope>,
    pub capture: Arc<CaptureProbe>,
    pub permissions: Arc<FakePermissions>,
    pub keep_alive: Arc<ProcessKeepAlive>,
    pub output_dir: PathBuf,
}

pub const WAKE_LOCK_TAG: &str = "test::CallRecordingWakeLock";

pub fn spawn_recorder(output_dir: &Path, granted: PermissionSet) -> Harness {
    let config = Config::default();
    let capture = Arc::new(CaptureProbe::default());
    let permissions = Arc::new(FakePermissions::new(granted));
    let keep_alive = Arc::new(ProcessKeepAlive::new());
    let emitter = EventEmitter::default();
    let events = emitter.subscribe();

    let keeper = ForegroundSessionKeeper::new(
        keep_alive.clone(),
        config.keepalive.call_notification(),
        WAKE_LOCK_TAG,
    );

    let (recorder, task) = RecorderHandle::spawn(RecorderParts {
        backend: Box::new(FakeCapture::new(capture.clone())),
        permissions: PermissionGate::new(permissions.clone()),
        keeper,
        events: emitter,
        settings: RecorderSettings {
            output_dir: output_dir.to_path_buf(),
            file_prefix: "CALL_".to_string(),
        },
    });

    Harness {
        recorder,
        task,
        events,
        capture,
        permissions,
        keep_alive,
        output_dir: output_dir.to_path_buf(),
    }
}

/// Every event emitted so far, without waiting
pub fn drain(rx: &mut broadcast::Receiver<EventEnvelope>) -> Vec<RecorderEvent> {
    let mut events = Vec::new();
    while let Ok(envelope) = rx.try_recv() {
        events.push(envelope.event);
    }
    events
}

pub fn count_started(events: &[RecorderEvent]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, RecorderEvent::Started { .. }))
        .count()
}
