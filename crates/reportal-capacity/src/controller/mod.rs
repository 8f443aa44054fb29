//! The capacity lifecycle state machine.
//!
//! One task owns the presence count, the controller state and the idle
//! deadline. Presence signals and reconciliation results arrive on a bounded
//! channel; the idle deadline is polled in the same `select!`, after the
//! channel, so pending activity always beats an expired timer.

pub mod handle;
pub mod state;

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use reportal_core::AppResult;
use reportal_core::config::AppConfig;
use reportal_database::{ActivityStore, CapacityConfigStore};
use reportal_entity::capacity::CapacitySettings;

use crate::adapter::CapacityControl;
use crate::presence::{PresenceSignal, PresenceTracker, PresenceTransition};
use crate::schedule::ScheduleEvaluator;

pub use handle::{CapacityHandle, ControlEvent};
pub use state::{ControllerSnapshot, ControllerState, TimerOutcome};

/// Tunables for the controller.
#[derive(Debug, Clone, Copy)]
pub struct ControllerOptions {
    /// How long presence must stay at zero before suspending.
    pub idle_timeout: Duration,
    /// Heartbeat window used when the controller queries the store itself.
    pub active_window: Duration,
    /// Schedule gate.
    pub evaluator: ScheduleEvaluator,
}

impl ControllerOptions {
    /// Derive options from the application configuration.
    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        Ok(Self {
            idle_timeout: config.capacity.idle_timeout(),
            active_window: config.activity.active_window(),
            evaluator: ScheduleEvaluator::from_config(&config.capacity)?,
        })
    }
}

/// Presence-driven autoscaler for one capacity.
#[derive(Debug)]
pub struct CapacityController {
    config_store: Arc<dyn CapacityConfigStore>,
    activity_store: Arc<dyn ActivityStore>,
    adapter: Arc<dyn CapacityControl>,
    options: ControllerOptions,
    presence: PresenceTracker,
    state: ControllerState,
    idle_deadline: Option<Instant>,
}

impl CapacityController {
    /// Creates a controller in the [`ControllerState::Unknown`] state.
    pub fn new(
        config_store: Arc<dyn CapacityConfigStore>,
        activity_store: Arc<dyn ActivityStore>,
        adapter: Arc<dyn CapacityControl>,
        options: ControllerOptions,
    ) -> Self {
        Self {
            config_store,
            activity_store,
            adapter,
            options,
            presence: PresenceTracker::new(),
            state: ControllerState::Unknown,
            idle_deadline: None,
        }
    }

    /// Move the controller onto its own task.
    ///
    /// The task ends when `shutdown` flips to `true` or every handle is dropped.
    pub fn spawn(
        self,
        buffer: usize,
        shutdown: watch::Receiver<bool>,
    ) -> (CapacityHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        let task = tokio::spawn(self.run(rx, shutdown));
        (CapacityHandle::new(tx), task)
    }

    async fn run(
        mut self,
        mut events: mpsc::Receiver<ControlEvent>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        info!(
            idle_timeout_secs = self.options.idle_timeout.as_secs(),
            "Capacity controller started"
        );

        loop {
            let deadline = self.idle_deadline;

            tokio::select! {
                biased;

                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                event = events.recv() => match event {
                    Some(event) => self.handle_event(event).await,
                    None => break,
                },
                () = idle_timer(deadline) => {
                    let outcome = self.on_idle_timer().await;
                    info!(?outcome, state = %self.state, "Idle timer fired");
                }
            }
        }

        info!(state = %self.state, "Capacity controller stopped");
    }

    async fn handle_event(&mut self, event: ControlEvent) {
        match event {
            ControlEvent::Presence(signal) => self.on_presence(signal).await,
            ControlEvent::Reconcile { active_sessions } => {
                self.on_reconcile(active_sessions).await;
            }
            ControlEvent::Snapshot(reply) => {
                // The requester may have gone away; nothing to do then.
                let _ = reply.send(self.snapshot());
            }
        }
    }

    /// Current view of the controller.
    pub fn snapshot(&self) -> ControllerSnapshot {
        ControllerSnapshot {
            state: self.state,
            presence: self.presence.count(),
            idle_timer_armed: self.idle_deadline.is_some(),
            last_observed: self.adapter.last_observed(),
        }
    }

    async fn on_presence(&mut self, signal: PresenceSignal) {
        let transition = self.presence.apply(signal);
        debug!(?signal, presence = self.presence.count(), "Presence signal");

        match transition {
            Some(PresenceTransition::ActivityDetected) => self.on_activity("presence").await,
            Some(PresenceTransition::IdleDetected) => self.consider_idle(None).await,
            None => {}
        }
    }

    async fn on_reconcile(&mut self, active_sessions: u64) {
        debug!(
            active_sessions,
            presence = self.presence.count(),
            state = %self.state,
            "Reconciliation tick"
        );

        if active_sessions > 0 {
            self.on_activity("reconciliation").await;
        } else {
            self.consider_idle(Some(active_sessions)).await;
        }
    }

    /// Someone is here: cancel any pending suspend, then make sure the
    /// capacity is up.
    async fn on_activity(&mut self, source: &'static str) {
        if self.cancel_idle_timer() {
            info!(source, "Activity cancelled pending suspend");
            self.transition(ControllerState::WatchingActive);
        }

        let Some(settings) = self.open_gate().await else {
            return;
        };

        match self.adapter.get_state(&settings).await {
            state if state.is_down() => match self.adapter.resume(&settings).await {
                Ok(()) => {
                    info!(source, observed = %state, "Capacity resume requested");
                    self.transition(ControllerState::WatchingActive);
                }
                Err(e) => {
                    warn!(source, error = %e, "Capacity resume failed; retrying on next tick");
                }
            },
            state if state.is_up() => self.transition(ControllerState::WatchingActive),
            state => debug!(source, observed = %state, "Capacity state unavailable; no action"),
        }
    }

    /// Nobody seems to be here. Start debouncing if the shared store agrees.
    ///
    /// `store_count` is the count a reconciliation pass already read; `None`
    /// means query the store now.
    async fn consider_idle(&mut self, store_count: Option<u64>) {
        if !self.presence.is_idle() {
            return;
        }

        let Some(settings) = self.open_gate().await else {
            return;
        };

        let active = match store_count {
            Some(count) => count,
            None => match self.store_active_count().await {
                Some(count) => count,
                None => return,
            },
        };
        if active > 0 {
            debug!(active, "Heartbeats still inside the active window; not debouncing");
            return;
        }

        match self.state {
            ControllerState::SuspendedConfirmed => {
                let observed = self.adapter.get_state(&settings).await;
                if observed.is_up() {
                    info!(%observed, "Capacity resumed out of band; restarting idle debounce");
                    self.arm_idle_timer();
                    self.transition(ControllerState::DebouncingIdle);
                }
            }
            _ if self.idle_deadline.is_some() => {
                debug!("Idle timer already armed");
            }
            _ => {
                self.arm_idle_timer();
                self.transition(ControllerState::DebouncingIdle);
            }
        }
    }

    async fn on_idle_timer(&mut self) -> TimerOutcome {
        self.idle_deadline = None;

        if self.state != ControllerState::DebouncingIdle || !self.presence.is_idle() {
            return TimerOutcome::RaceSuppressed;
        }

        let Some(settings) = self.open_gate().await else {
            return TimerOutcome::Deferred;
        };

        match self.store_active_count().await {
            Some(0) => {}
            Some(_) => return TimerOutcome::RaceSuppressed,
            None => return TimerOutcome::Deferred,
        }

        match self.adapter.get_state(&settings).await {
            state if state.is_up() => match self.adapter.suspend(&settings).await {
                Ok(()) => {
                    self.transition(ControllerState::SuspendedConfirmed);
                    TimerOutcome::Suspended
                }
                Err(e) => {
                    warn!(error = %e, "Capacity suspend failed; retrying on next tick");
                    TimerOutcome::Deferred
                }
            },
            state if state.is_down() => {
                self.transition(ControllerState::SuspendedConfirmed);
                TimerOutcome::AlreadySuspended
            }
            _ => TimerOutcome::Deferred,
        }
    }

    /// Settings that allow autonomous action right now, or `None`.
    ///
    /// Settings and schedule are re-read on every call.
    async fn open_gate(&self) -> Option<CapacitySettings> {
        let settings = match self.config_store.get_settings().await {
            Ok(Some(settings)) => settings,
            Ok(None) => {
                debug!("No capacity settings; autoscaling disabled");
                return None;
            }
            Err(e) => {
                warn!(error = %e, "Failed to read capacity settings");
                return None;
            }
        };

        if !settings.auto_managed_capacity {
            debug!("Capacity is not auto-managed");
            return None;
        }
        if let Err(missing) = settings.address() {
            debug!(field = missing.0, "Capacity settings incomplete; autoscaling disabled");
            return None;
        }

        let schedule = match self.config_store.get_schedule().await {
            Ok(schedule) => schedule,
            Err(e) => {
                warn!(error = %e, "Failed to read capacity schedule");
                return None;
            }
        };
        if !self.options.evaluator.is_within_schedule(&schedule, Utc::now()) {
            debug!("Outside scheduled hours; no autonomous action");
            return None;
        }

        Some(settings)
    }

    async fn store_active_count(&self) -> Option<u64> {
        match self
            .activity_store
            .count_active_since(self.options.active_window)
            .await
        {
            Ok(count) => Some(count),
            Err(e) => {
                warn!(error = %e, "Failed to count active sessions");
                None
            }
        }
    }

    fn arm_idle_timer(&mut self) {
        self.idle_deadline = Some(Instant::now() + self.options.idle_timeout);
        info!(
            idle_timeout_secs = self.options.idle_timeout.as_secs(),
            "Idle timer armed"
        );
    }

    fn cancel_idle_timer(&mut self) -> bool {
        self.idle_deadline.take().is_some()
    }

    fn transition(&mut self, to: ControllerState) {
        if self.state != to {
            info!(from = %self.state, to = %to, "Capacity controller transition");
            self.state = to;
        }
    }
}

async fn idle_timer(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
