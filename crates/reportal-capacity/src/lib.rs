//! # reportal-capacity
//!
//! Presence-driven lifecycle management for the BI capacity that backs
//! report rendering.
//!
//! - [`presence`]: process-local count of engaged realtime connections
//! - [`schedule`]: business-hour gating
//! - [`adapter`]: the management API client and its token cache
//! - [`controller`]: the single-task state machine that decides when to
//!   resume and when to suspend

pub mod adapter;
pub mod controller;
pub mod error;
pub mod presence;
pub mod schedule;

pub use adapter::CapacityControl;
pub use controller::{
    CapacityController, CapacityHandle, ControllerOptions, ControllerSnapshot, ControllerState,
};
pub use error::{CapacityError, CapacityResult};
pub use presence::{PresenceSignal, PresenceTracker, PresenceTransition};
pub use schedule::ScheduleEvaluator;
