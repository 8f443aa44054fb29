//! Presence tracker: counts engaged realtime connections in this process.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Inbound realtime event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresenceSignal {
    /// A realtime connection opened.
    Connect,
    /// A realtime connection closed.
    Disconnect,
    /// A connected client became visible again.
    Active,
    /// A connected client went to the background.
    Away,
}

/// Edge reported to the controller when the count crosses zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenceTransition {
    /// The count went from 0 to 1.
    ActivityDetected,
    /// The count went from 1 to 0.
    IdleDetected,
}

/// Live count of engaged sessions.
///
/// Owned by the controller task; never shared and never persisted. A
/// restart resets it to zero, which the reconciliation job corrects.
#[derive(Debug, Default)]
pub struct PresenceTracker {
    count: u64,
}

impl PresenceTracker {
    /// Creates a tracker with no presence.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current count.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Whether no session is engaged locally.
    pub fn is_idle(&self) -> bool {
        self.count == 0
    }

    /// Dispatch a realtime signal.
    pub fn apply(&mut self, signal: PresenceSignal) -> Option<PresenceTransition> {
        match signal {
            PresenceSignal::Connect => self.on_connect(),
            PresenceSignal::Active => self.on_active(),
            PresenceSignal::Disconnect => self.on_disconnect(),
            PresenceSignal::Away => self.on_away(),
        }
    }

    /// A connection opened.
    pub fn on_connect(&mut self) -> Option<PresenceTransition> {
        self.increment()
    }

    /// Renewed activity on an existing connection.
    pub fn on_active(&mut self) -> Option<PresenceTransition> {
        self.increment()
    }

    /// A connection closed.
    pub fn on_disconnect(&mut self) -> Option<PresenceTransition> {
        self.decrement(PresenceSignal::Disconnect)
    }

    /// A connection went to the background.
    pub fn on_away(&mut self) -> Option<PresenceTransition> {
        self.decrement(PresenceSignal::Away)
    }

    fn increment(&mut self) -> Option<PresenceTransition> {
        self.count = self.count.saturating_add(1);
        (self.count == 1).then_some(PresenceTransition::ActivityDetected)
    }

    fn decrement(&mut self, signal: PresenceSignal) -> Option<PresenceTransition> {
        if self.count == 0 {
            warn!(?signal, "Presence decrement without matching increment; clamped at zero");
            return None;
        }
        self.count -= 1;
        (self.count == 0).then_some(PresenceTransition::IdleDetected)
    }
}
