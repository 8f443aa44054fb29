//! Heartbeat store configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Heartbeat store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityConfig {
    /// A session counts as active if it pinged within this many seconds.
    #[serde(default = "default_active_window")]
    pub active_window_seconds: u64,
}

impl Default for ActivityConfig {
    fn default() -> Self {
        Self {
            active_window_seconds: default_active_window(),
        }
    }
}

impl ActivityConfig {
    /// The active window as a [`Duration`].
    pub fn active_window(&self) -> Duration {
        Duration::from_secs(self.active_window_seconds)
    }
}

fn default_active_window() -> u64 {
    300
}
