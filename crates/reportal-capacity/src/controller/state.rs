//! Controller state and observable snapshots.

use serde::{Deserialize, Serialize};

use reportal_entity::capacity::CapacityState;

/// The controller's belief about what the capacity should be doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControllerState {
    /// No decision made since startup.
    Unknown,
    /// The capacity should stay up.
    WatchingActive,
    /// Nobody is present; the idle timer may be running.
    DebouncingIdle,
    /// Suspend was accepted or the capacity was found already down.
    SuspendedConfirmed,
}

impl ControllerState {
    /// Return the state as a snake_case string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::WatchingActive => "watching_active",
            Self::DebouncingIdle => "debouncing_idle",
            Self::SuspendedConfirmed => "suspended_confirmed",
        }
    }
}

impl std::fmt::Display for ControllerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What happened when the idle timer fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerOutcome {
    /// Suspend was issued and accepted.
    Suspended,
    /// The capacity was already down; nothing issued.
    AlreadySuspended,
    /// Presence reappeared locally or in the shared store.
    RaceSuppressed,
    /// Gate closed, store unreadable, state unavailable, or suspend failed.
    Deferred,
}

/// Point-in-time view of the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerSnapshot {
    /// Current controller state.
    pub state: ControllerState,
    /// Local presence count.
    pub presence: u64,
    /// Whether an idle timer is pending.
    pub idle_timer_armed: bool,
    /// Last capacity state seen by the adapter.
    pub last_observed: Option<CapacityState>,
}
