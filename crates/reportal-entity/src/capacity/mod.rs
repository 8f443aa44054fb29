//! Capacity settings and externally observed capacity state.

pub mod settings;
pub mod state;

pub use settings::{CapacityAddress, CapacitySettings, CapacityType, IncompleteSettings};
pub use state::CapacityState;
