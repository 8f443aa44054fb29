//! The only component permitted to call the external control plane.

pub mod arm;
pub mod token;

use async_trait::async_trait;

use reportal_entity::capacity::{CapacitySettings, CapacityState};

use crate::error::CapacityResult;

pub use arm::ArmCapacityAdapter;
pub use token::{
    AccessToken, ClientCredentials, MissingCredentials, StaticBearer, TokenCache, TokenSource,
};

/// Control surface over a capacity resource.
///
/// Settings are passed per call so the caller's freshly read configuration
/// is always the one acted on.
#[async_trait]
pub trait CapacityControl: Send + Sync + std::fmt::Debug + 'static {
    /// Poll the current state.
    ///
    /// Never fails: missing addressing, transport errors and unknown
    /// provider states all yield [`CapacityState::Unavailable`].
    async fn get_state(&self, settings: &CapacitySettings) -> CapacityState;

    /// Ask the provider to resume. A no-op when the resource is already up.
    async fn resume(&self, settings: &CapacitySettings) -> CapacityResult<()>;

    /// Ask the provider to suspend. A no-op when the resource is already down.
    ///
    /// Refused when nothing has been observed yet or the last observation
    /// was [`CapacityState::Unavailable`].
    async fn suspend(&self, settings: &CapacitySettings) -> CapacityResult<()>;

    /// The most recent state observed or implied by an accepted command.
    fn last_observed(&self) -> Option<CapacityState>;
}
