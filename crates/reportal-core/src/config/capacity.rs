//! Capacity controller configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Capacity controller and management API client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapacityConfig {
    /// How long presence must stay at zero before the capacity is suspended.
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_seconds: u64,
    /// Bound of the controller's event channel.
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
    /// Fixed offset from UTC, in minutes, in which schedule rows are evaluated.
    #[serde(default)]
    pub utc_offset_minutes: i32,
    /// Base URL of the resource management API.
    #[serde(default = "default_management_endpoint")]
    pub management_endpoint: String,
    /// Per-request timeout for management API and token calls.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

impl Default for CapacityConfig {
    fn default() -> Self {
        Self {
            idle_timeout_seconds: default_idle_timeout(),
            event_buffer: default_event_buffer(),
            utc_offset_minutes: 0,
            management_endpoint: default_management_endpoint(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

impl CapacityConfig {
    /// The idle debounce window as a [`Duration`].
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_seconds)
    }

    /// The outbound request timeout as a [`Duration`].
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

fn default_idle_timeout() -> u64 {
    300
}

fn default_event_buffer() -> usize {
    256
}

fn default_management_endpoint() -> String {
    "https://management.azure.com".to_string()
}

fn default_request_timeout() -> u64 {
    30
}
