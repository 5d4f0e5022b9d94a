use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::keepalive::{ForegroundNotification, Importance};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub service: ServiceConfig,
    pub recording: RecordingConfig,
    pub keepalive: KeepAliveConfig,
    pub server: ServerConfig,
    pub nats: NatsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "call-recorder".to_string(),
            http: HttpConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 5001,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordingConfig {
    /// Public media directory recordings are written to
    pub output_dir: PathBuf,

    /// File name prefix, followed by the local start timestamp
    pub file_prefix: String,

    /// Sample rate of PCM frames pushed into the capture tap
    pub sample_rate: u32,

    /// Number of channels of PCM frames pushed into the capture tap
    pub channels: u16,

    /// Treat every capability as granted until the host reports otherwise
    pub assume_permissions_granted: bool,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("recordings"),
            file_prefix: "CALL_".to_string(),
            sample_rate: 16000, // Telephony voice band
            channels: 1,        // Mono
            assume_permissions_granted: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeepAliveConfig {
    pub call_channel_id: String,
    pub call_channel_name: String,
    pub call_title: String,
    pub call_text: String,
    pub call_wake_lock_tag: String,
    pub monitor_channel_id: String,
    pub monitor_channel_name: String,
    pub monitor_title: String,
    pub monitor_text: String,
    pub monitor_wake_lock_tag: String,
}

impl Default for KeepAliveConfig {
    fn default() -> Self {
        Self {
            call_channel_id: "CallRecordingChannel".to_string(),
            call_channel_name: "Call Recording Service".to_string(),
            call_title: "Call Recording Active".to_string(),
            call_text: "Recording calls in background".to_string(),
            call_wake_lock_tag: "CallRecorder::CallRecordingWakeLock".to_string(),
            monitor_channel_id: "AudioRecordingChannel".to_string(),
            monitor_channel_name: "Audio Recording Service".to_string(),
            monitor_title: "Voice Monitoring Active".to_string(),
            monitor_text: "Recording audio in background".to_string(),
            monitor_wake_lock_tag: "CallRecorder::AudioRecordingWakeLock".to_string(),
        }
    }
}

impl KeepAliveConfig {
    pub fn call_notification(&self) -> ForegroundNotification {
        ForegroundNotification {
            id: 1,
            channel_id: self.call_channel_id.clone(),
            channel_name: self.call_channel_name.clone(),
            title: self.call_title.clone(),
            text: self.call_text.clone(),
            importance: Importance::Low,
        }
    }

    pub fn monitor_notification(&self) -> ForegroundNotification {
        ForegroundNotification {
            id: 2,
            channel_id: self.monitor_channel_id.clone(),
            channel_name: self.monitor_channel_name.clone(),
            title: self.monitor_title.clone(),
            text: self.monitor_text.clone(),
            importance: Importance::Low,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Program launched to bring the embedded server up
    pub command: String,
    pub args: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            command: "python3".to_string(),
            args: vec!["server_bridge.py".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NatsConfig {
    pub enabled: bool,
    pub url: String,
    pub subject_prefix: String,
}

impl Default for NatsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url: "nats://localhost:4222".to_string(),
            subject_prefix: "recorder.events".to_string(),
        }
    }
}

impl Config {
    /// Load from `path` (extension optional) with `CALL_RECORDER__*` overrides
    ///
    /// A missing file is an error; every key inside it is optional.
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix("CALL_RECORDER").separator("__"))
            .build()
            .with_context(|| format!("Failed to read config from {}", path))?;

        settings
            .try_deserialize()
            .context("Failed to parse config")
    }
}
