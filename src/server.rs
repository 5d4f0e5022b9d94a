//! Embedded server supervision
//!
//! The server itself is opaque: a `ServerLauncher` brings it up and
//! reports a status string. The supervisor turns the process-wide
//! "started" flag into explicit state with init-once semantics.

use anyhow::{bail, Context, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::process::{Child, Command};
use tokio::sync::{Mutex, OnceCell};
use tracing::{info, warn};

use crate::config::ServerConfig;

pub const ALREADY_RUNNING: &str = "Server already running";

#[async_trait::async_trait]
pub trait ServerLauncher: Send + Sync {
    /// One-time runtime setup, retried on the next start if it fails
    async fn init_runtime(&self) -> Result<()>;

    async fn launch(&self) -> Result<String>;

    async fn shutdown(&self) {}
}

pub struct ServerSupervisor {
    launcher: Arc<dyn ServerLauncher>,
    runtime: OnceCell<()>,
    start_lock: Mutex<()>,
    running: AtomicBool,
}

impl ServerSupervisor {
    pub fn new(launcher: Arc<dyn ServerLauncher>) -> Self {
        Self {
            launcher,
            runtime: OnceCell::new(),
            start_lock: Mutex::new(()),
            running: AtomicBool::new(false),
        }
    }

    /// Start the server unless it is already up
    pub async fn start_if_needed(&self) -> Result<String> {
        let _guard = self.start_lock.lock().await;

        if self.running.load(Ordering::SeqCst) {
            return Ok(ALREADY_RUNNING.to_string());
        }

        self.runtime
            .get_or_try_init(|| self.launcher.init_runtime())
            .await
            .context("Failed to initialize server runtime")?;

        let result = self.launcher.launch().await?;
        self.running.store(true, Ordering::SeqCst);

        info!("Server started: {}", result);

        Ok(result)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub async fn shutdown(&self) {
        let _guard = self.start_lock.lock().await;
        if self.running.swap(false, Ordering::SeqCst) {
            self.launcher.shutdown().await;
        }
    }
}

/// Launches the server as a child process
pub struct CommandLauncher {
    config: ServerConfig,
    child: Mutex<Option<Child>>,
}

impl CommandLauncher {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            child: Mutex::new(None),
        }
    }
}

#[async_trait::async_trait]
impl ServerLauncher for CommandLauncher {
    async fn init_runtime(&self) -> Result<()> {
        if self.config.command.trim().is_empty() {
            bail!("No server command configured");
        }
        info!("Server runtime ready ({})", self.config.command);
        Ok(())
    }

    async fn launch(&self) -> Result<String> {
        info!(
            "Launching server: {} {}",
            self.config.command,
            self.config.args.join(" ")
        );

        let child = Command::new(&self.config.command)
            .args(&self.config.args)
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("Failed to spawn {}", self.config.command))?;

        let message = match child.id() {
            Some(pid) => format!("Server started (pid {})", pid),
            None => "Server started".to_string(),
        };

        *self.child.lock().await = Some(child);

        Ok(message)
    }

    async fn shutdown(&self) {
        if let Some(mut child) = self.child.lock().await.take() {
            info!("Stopping server process");
            if let Err(e) = child.kill().await {
                warn!("Failed to stop server process: {}", e);
            }
        }
    }
}
