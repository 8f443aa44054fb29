//! Azure Resource Manager implementation of [`CapacityControl`].

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info, warn};

use reportal_core::config::CapacityConfig;
use reportal_core::error::ErrorKind;
use reportal_core::{AppError, AppResult};
use reportal_entity::capacity::{CapacityAddress, CapacitySettings, CapacityState};

use super::CapacityControl;
use super::token::TokenCache;
use crate::error::{CapacityError, CapacityResult};

#[derive(Debug, Deserialize)]
struct CapacityResource {
    #[serde(default)]
    properties: CapacityProperties,
}

#[derive(Debug, Default, Deserialize)]
struct CapacityProperties {
    #[serde(default)]
    state: Option<String>,
}

/// Last known state of one resource.
#[derive(Debug, Clone)]
struct Observation {
    resource: String,
    state: CapacityState,
}

/// Talks to `Microsoft.Fabric` or `Microsoft.PowerBIDedicated` capacities.
pub struct ArmCapacityAdapter {
    client: reqwest::Client,
    endpoint: String,
    tokens: Arc<TokenCache>,
    observed: Mutex<Option<Observation>>,
}

impl std::fmt::Debug for ArmCapacityAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArmCapacityAdapter")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl ArmCapacityAdapter {
    /// Build an adapter with the configured endpoint and request timeout.
    pub fn new(config: &CapacityConfig, tokens: Arc<TokenCache>) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| {
                AppError::with_source(ErrorKind::Internal, "Failed to build ARM HTTP client", e)
            })?;

        Ok(Self {
            client,
            endpoint: config.management_endpoint.trim_end_matches('/').to_string(),
            tokens,
            observed: Mutex::new(None),
        })
    }

    fn resource_url(&self, address: &CapacityAddress, action: Option<&str>) -> String {
        let action = action.map(|a| format!("/{a}")).unwrap_or_default();
        format!(
            "{}{}{}?api-version={}",
            self.endpoint,
            address.resource_path(),
            action,
            address.capacity_type.api_version()
        )
    }

    fn observed_for(&self, address: &CapacityAddress) -> Option<CapacityState> {
        let path = address.resource_path();
        self.observed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .filter(|o| o.resource == path)
            .map(|o| o.state)
    }

    fn observe(&self, resource: String, state: CapacityState) {
        *self.observed.lock().unwrap_or_else(PoisonError::into_inner) =
            Some(Observation { resource, state });
    }

    async fn bearer(&self) -> CapacityResult<String> {
        self.tokens
            .token()
            .await
            .map_err(|e| CapacityError::AdapterUnavailable(e.to_string()))
    }

    async fn fetch_state(&self, address: &CapacityAddress) -> CapacityResult<CapacityState> {
        let token = self.bearer().await?;
        let response = self
            .client
            .get(self.resource_url(address, None))
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| CapacityError::AdapterUnavailable(format!("GET failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CapacityError::AdapterUnavailable(format!(
                "GET returned {status}"
            )));
        }

        let resource: CapacityResource = response
            .json()
            .await
            .map_err(|e| CapacityError::AdapterUnavailable(format!("malformed body: {e}")))?;

        Ok(CapacityState::from_provider_state(
            resource.properties.state.as_deref().unwrap_or_default(),
        ))
    }

    async fn post_action(&self, address: &CapacityAddress, action: &str) -> CapacityResult<()> {
        let token = self.bearer().await?;
        let response = self
            .client
            .post(self.resource_url(address, Some(action)))
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| CapacityError::AdapterUnavailable(format!("{action} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CapacityError::AdapterUnavailable(format!(
                "{action} returned {status}"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl CapacityControl for ArmCapacityAdapter {
    async fn get_state(&self, settings: &CapacitySettings) -> CapacityState {
        let address = match settings.address() {
            Ok(address) => address,
            Err(missing) => {
                debug!(field = missing.0, "Capacity not addressable");
                *self.observed.lock().unwrap_or_else(PoisonError::into_inner) = None;
                return CapacityState::Unavailable;
            }
        };

        let state = match self.fetch_state(&address).await {
            Ok(state) => state,
            Err(e) => {
                warn!(capacity = %address.capacity_name, error = %e, "Capacity state poll failed");
                CapacityState::Unavailable
            }
        };

        debug!(capacity = %address.capacity_name, %state, "Capacity state polled");
        self.observe(address.resource_path(), state);
        state
    }

    async fn resume(&self, settings: &CapacitySettings) -> CapacityResult<()> {
        let address = settings.address()?;

        if let Some(state) = self.observed_for(&address).filter(CapacityState::is_up) {
            debug!(%state, "Resume skipped; capacity already up");
            return Ok(());
        }

        self.post_action(&address, "resume").await?;
        self.observe(address.resource_path(), CapacityState::Resuming);
        info!(capacity = %address.capacity_name, "Capacity resume accepted");
        Ok(())
    }

    async fn suspend(&self, settings: &CapacitySettings) -> CapacityResult<()> {
        let address = settings.address()?;

        match self.observed_for(&address) {
            None | Some(CapacityState::Unavailable) => {
                return Err(CapacityError::AdapterUnavailable(
                    "capacity state unknown; refusing to suspend".to_string(),
                ));
            }
            Some(state) if state.is_down() => {
                debug!(%state, "Suspend skipped; capacity already down");
                return Ok(());
            }
            Some(_) => {}
        }

        self.post_action(&address, "suspend").await?;
        self.observe(address.resource_path(), CapacityState::Suspending);
        info!(capacity = %address.capacity_name, "Capacity suspend accepted");
        Ok(())
    }

    fn last_observed(&self) -> Option<CapacityState> {
        self.observed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|o| o.state)
    }
}
