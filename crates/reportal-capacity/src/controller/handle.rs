//! Cloneable front door to the controller task.

use tokio::sync::{mpsc, oneshot};

use reportal_core::{AppError, AppResult};

use super::state::ControllerSnapshot;
use crate::presence::PresenceSignal;

/// Messages consumed by the controller loop.
#[derive(Debug)]
pub enum ControlEvent {
    /// A realtime presence signal.
    Presence(PresenceSignal),
    /// Result of a reconciliation pass over the heartbeat store.
    Reconcile {
        /// Sessions that pinged inside the active window.
        active_sessions: u64,
    },
    /// Request for a snapshot.
    Snapshot(oneshot::Sender<ControllerSnapshot>),
}

/// Sends events to a running [`CapacityController`](super::CapacityController).
#[derive(Debug, Clone)]
pub struct CapacityHandle {
    tx: mpsc::Sender<ControlEvent>,
}

impl CapacityHandle {
    pub(crate) fn new(tx: mpsc::Sender<ControlEvent>) -> Self {
        Self { tx }
    }

    /// Forward a realtime presence signal.
    pub async fn presence(&self, signal: PresenceSignal) -> AppResult<()> {
        self.send(ControlEvent::Presence(signal)).await
    }

    /// Report the active-session count from the heartbeat store.
    pub async fn reconcile(&self, active_sessions: u64) -> AppResult<()> {
        self.send(ControlEvent::Reconcile { active_sessions }).await
    }

    /// Fetch the controller's current snapshot.
    pub async fn snapshot(&self) -> AppResult<ControllerSnapshot> {
        let (reply, rx) = oneshot::channel();
        self.send(ControlEvent::Snapshot(reply)).await?;
        rx.await
            .map_err(|_| AppError::service_unavailable("Capacity controller dropped the request"))
    }

    async fn send(&self, event: ControlEvent) -> AppResult<()> {
        self.tx
            .send(event)
            .await
            .map_err(|_| AppError::service_unavailable("Capacity controller is not running"))
    }
}
