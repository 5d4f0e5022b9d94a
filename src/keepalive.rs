//! Process keep-alive
//!
//! While a session is active the hosting process is promoted to the
//! foreground and holds a wake lock. The platform mechanics live behind
//! [`KeepAlive`]; [`ForegroundSessionKeeper`] owns the resources for one
//! service and releases them on every exit path, including drop.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Importance {
    Low,
    Default,
    High,
}

/// Persistent notification shown while promoted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForegroundNotification {
    pub id: u32,
    pub channel_id: String,
    pub channel_name: String,
    pub title: String,
    pub text: String,
    pub importance: Importance,
}

/// Platform keep-alive capability
pub trait KeepAlive: Send + Sync {
    fn promote_foreground(&self, notification: &ForegroundNotification) -> Result<()>;

    fn remove_foreground(&self, notification_id: u32);

    fn acquire_wake_lock(&self, tag: &str) -> Result<()>;

    fn release_wake_lock(&self, tag: &str);

    fn is_wake_lock_held(&self, tag: &str) -> bool;
}

pub struct ForegroundSessionKeeper {
    platform: Arc<dyn KeepAlive>,
    notification: ForegroundNotification,
    wake_lock_tag: String,
    promoted: bool,
}

impl ForegroundSessionKeeper {
    pub fn new(
        platform: Arc<dyn KeepAlive>,
        notification: ForegroundNotification,
        wake_lock_tag: impl Into<String>,
    ) -> Self {
        Self {
            platform,
            notification,
            wake_lock_tag: wake_lock_tag.into(),
            promoted: false,
        }
    }

    /// Session start hook
    ///
    /// Leaves nothing held if either step fails.
    pub fn engage(&mut self) -> Result<()> {
        if !self.promoted {
            self.platform.promote_foreground(&self.notification)?;
            self.promoted = true;
        }

        if !self.platform.is_wake_lock_held(&self.wake_lock_tag) {
            if let Err(e) = self.platform.acquire_wake_lock(&self.wake_lock_tag) {
                self.release();
                return Err(e);
            }
        }

        info!(
            "Keep-alive engaged (notification {}, wake lock {})",
            self.notification.id, self.wake_lock_tag
        );

        Ok(())
    }

    /// Session stop and teardown hook; safe to call repeatedly
    pub fn release(&mut self) {
        if self.platform.is_wake_lock_held(&self.wake_lock_tag) {
            self.platform.release_wake_lock(&self.wake_lock_tag);
        }

        if self.promoted {
            self.platform.remove_foreground(self.notification.id);
            self.promoted = false;
            info!("Keep-alive released ({})", self.wake_lock_tag);
        }
    }

    pub fn is_engaged(&self) -> bool {
        self.promoted
    }
}

impl Drop for ForegroundSessionKeeper {
    fn drop(&mut self) {
        if self.promoted || self.platform.is_wake_lock_held(&self.wake_lock_tag) {
            warn!("Releasing keep-alive on drop ({})", self.wake_lock_tag);
            self.release();
        }
    }
}

/// In-process keep-alive for hosts without an OS foreground concept
///
/// Tracks what is held so status queries and teardown checks stay accurate.
#[derive(Default)]
pub struct ProcessKeepAlive {
    foreground: Mutex<HashSet<u32>>,
    wake_locks: Mutex<HashSet<String>>,
}

impl ProcessKeepAlive {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_foreground(&self, notification_id: u32) -> bool {
        self.foreground
            .lock()
            .map(|ids| ids.contains(&notification_id))
            .unwrap_or(false)
    }

    pub fn held_wake_locks(&self) -> usize {
        self.wake_locks.lock().map(|locks| locks.len()).unwrap_or(0)
    }
}

impl KeepAlive for ProcessKeepAlive {
    fn promote_foreground(&self, notification: &ForegroundNotification) -> Result<()> {
        info!(
            "Foreground: {} - {} ({})",
            notification.title, notification.text, notification.channel_name
        );
        self.foreground
            .lock()
            .map_err(|_| anyhow::anyhow!("Foreground registry poisoned"))?
            .insert(notification.id);
        Ok(())
    }

    fn remove_foreground(&self, notification_id: u32) {
        if let Ok(mut ids) = self.foreground.lock() {
            ids.remove(&notification_id);
        }
    }

    fn acquire_wake_lock(&self, tag: &str) -> Result<()> {
        let mut locks = self
            .wake_locks
            .lock()
            .map_err(|_| anyhow::anyhow!("Wake lock registry poisoned"))?;
        if !locks.insert(tag.to_string()) {
            anyhow::bail!("Wake lock {} already held", tag);
        }
        Ok(())
    }

    fn release_wake_lock(&self, tag: &str) {
        if let Ok(mut locks) = self.wake_locks.lock() {
            locks.remove(tag);
        }
    }

    fn is_wake_lock_held(&self, tag: &str) -> bool {
        self.wake_locks
            .lock()
            .map(|locks| locks.contains(tag))
            .unwrap_or(false)
    }
}
