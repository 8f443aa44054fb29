//! Externally owned capacity state as reported by the management API.

use serde::{Deserialize, Serialize};

/// Capacity state, polled from the management API.
///
/// Never stored locally; the controller treats the most recent poll as
/// ground truth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapacityState {
    /// Running and billable.
    Active,
    /// Paused; not billable.
    Suspended,
    /// Resume accepted, not yet running.
    Resuming,
    /// Suspend accepted, not yet paused.
    Suspending,
    /// Unaddressable, unreachable, or in a state we cannot act on.
    Unavailable,
}

impl CapacityState {
    /// Map a provider `properties.state` string to a capacity state.
    pub fn from_provider_state(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "active" | "succeeded" | "scaling" | "updating" => Self::Active,
            "paused" | "suspended" => Self::Suspended,
            "resuming" | "preparing" | "provisioning" => Self::Resuming,
            "pausing" | "suspending" => Self::Suspending,
            _ => Self::Unavailable,
        }
    }

    /// Running or on its way up.
    pub fn is_up(&self) -> bool {
        matches!(self, Self::Active | Self::Resuming)
    }

    /// Paused or on its way down.
    pub fn is_down(&self) -> bool {
        matches!(self, Self::Suspended | Self::Suspending)
    }

    /// Return the state as a snake_case string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Suspended => "suspended",
            Self::Resuming => "resuming",
            Self::Suspending => "suspending",
            Self::Unavailable => "unavailable",
        }
    }
}

impl std::fmt::Display for CapacityState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
