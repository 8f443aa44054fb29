//! Bearer token acquisition for the management API.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use reportal_core::config::AzureConfig;
use reportal_core::{AppError, AppResult};

use crate::error::{CapacityError, CapacityResult};

/// Scope requested for Azure Resource Manager.
pub const MANAGEMENT_SCOPE: &str = "https://management.azure.com/.default";

/// A bearer token and its expiry, if known.
#[derive(Clone)]
pub struct AccessToken {
    /// The raw bearer value.
    pub secret: String,
    /// Absolute expiry. `None` for externally managed tokens.
    pub expires_at: Option<DateTime<Utc>>,
}

impl AccessToken {
    /// Whether the token can still be served, leaving `margin` before expiry.
    pub fn is_fresh(&self, margin: chrono::Duration, now: DateTime<Utc>) -> bool {
        self.expires_at.is_none_or(|at| now < at - margin)
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("secret", &"****")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Produces bearer tokens.
#[async_trait]
pub trait TokenSource: Send + Sync + std::fmt::Debug + 'static {
    /// Fetch a new token.
    async fn fetch(&self) -> CapacityResult<AccessToken>;
}

/// A token supplied from outside the process.
pub struct StaticBearer {
    token: String,
}

impl StaticBearer {
    /// Wraps an externally supplied bearer token.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl std::fmt::Debug for StaticBearer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticBearer").finish_non_exhaustive()
    }
}

#[async_trait]
impl TokenSource for StaticBearer {
    async fn fetch(&self) -> CapacityResult<AccessToken> {
        Ok(AccessToken {
            secret: self.token.clone(),
            expires_at: None,
        })
    }
}

/// OAuth2 client-credentials grant against the identity platform.
pub struct ClientCredentials {
    client: reqwest::Client,
    token_url: String,
    client_id: String,
    client_secret: String,
}

/// Longest lifetime honoured from a token response.
const MAX_TOKEN_LIFETIME_SECS: i64 = 24 * 60 * 60;

/// Expiry for a token issued at `now` with the endpoint's `expires_in`.
fn token_expiry(expires_in: i64, now: DateTime<Utc>) -> DateTime<Utc> {
    now + chrono::Duration::seconds(expires_in.clamp(0, MAX_TOKEN_LIFETIME_SECS))
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

impl ClientCredentials {
    /// Creates a grant for `{authority}/{tenant_id}/oauth2/v2.0/token`.
    pub fn new(
        authority: &str,
        tenant_id: &str,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        timeout: Duration,
    ) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                AppError::with_source(
                    reportal_core::error::ErrorKind::Internal,
                    "Failed to build token HTTP client",
                    e,
                )
            })?;

        Ok(Self {
            client,
            token_url: format!(
                "{}/{}/oauth2/v2.0/token",
                authority.trim_end_matches('/'),
                tenant_id
            ),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        })
    }

    /// Token endpoint in use.
    pub fn token_url(&self) -> &str {
        &self.token_url
    }
}

impl std::fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("token_url", &self.token_url)
            .field("client_id", &self.client_id)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl TokenSource for ClientCredentials {
    async fn fetch(&self) -> CapacityResult<AccessToken> {
        let response = self
            .client
            .post(&self.token_url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("scope", MANAGEMENT_SCOPE),
            ])
            .send()
            .await
            .map_err(|e| CapacityError::Token(format!("token request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CapacityError::Token(format!(
                "token endpoint returned {status}"
            )));
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| CapacityError::Token(format!("malformed token response: {e}")))?;

        Ok(AccessToken {
            secret: body.access_token,
            expires_at: Some(token_expiry(body.expires_in, Utc::now())),
        })
    }
}

/// Placeholder used when no credentials are configured.
///
/// Every fetch fails, so the adapter reports `Unavailable` and the
/// controller never mutates the capacity.
#[derive(Debug, Default)]
pub struct MissingCredentials;

#[async_trait]
impl TokenSource for MissingCredentials {
    async fn fetch(&self) -> CapacityResult<AccessToken> {
        Err(CapacityError::Token(
            "no management API credentials configured".to_string(),
        ))
    }
}

/// Serves a cached token until shortly before expiry.
///
/// Refresh happens under the lock, so concurrent callers share one fetch.
#[derive(Debug)]
pub struct TokenCache {
    source: Arc<dyn TokenSource>,
    margin: chrono::Duration,
    cached: Mutex<Option<AccessToken>>,
}

impl TokenCache {
    /// Wrap `source`, refreshing `margin` before expiry.
    pub fn new(source: Arc<dyn TokenSource>, margin: Duration) -> Self {
        Self {
            source,
            margin: chrono::Duration::from_std(margin).unwrap_or(chrono::Duration::zero()),
            cached: Mutex::new(None),
        }
    }

    /// Pick the token source the configuration describes.
    ///
    /// An explicit bearer token wins over client credentials.
    pub fn from_config(config: &AzureConfig, timeout: Duration) -> AppResult<Self> {
        let margin = Duration::from_secs(config.token_refresh_margin_seconds);

        if let Some(token) = config.bearer_token.as_deref().filter(|t| !t.is_empty()) {
            info!("Management API auth: static bearer token");
            return Ok(Self::new(Arc::new(StaticBearer::new(token)), margin));
        }

        match (&config.tenant_id, &config.client_id, &config.client_secret) {
            (Some(tenant), Some(client_id), Some(secret)) if config.has_client_credentials() => {
                let source =
                    ClientCredentials::new(&config.authority, tenant, client_id, secret, timeout)?;
                info!(token_url = %source.token_url(), "Management API auth: client credentials");
                Ok(Self::new(Arc::new(source), margin))
            }
            _ => {
                warn!("No management API credentials configured; capacity will not be managed");
                Ok(Self::new(Arc::new(MissingCredentials), margin))
            }
        }
    }

    /// A valid bearer token, fetching a new one when needed.
    pub async fn token(&self) -> CapacityResult<String> {
        let mut cached = self.cached.lock().await;

        if let Some(token) = cached.as_ref().filter(|t| t.is_fresh(self.margin, Utc::now())) {
            return Ok(token.secret.clone());
        }

        debug!("Fetching management API token");
        match self.source.fetch().await {
            Ok(token) => {
                let secret = token.secret.clone();
                *cached = Some(token);
                Ok(secret)
            }
            Err(e) => {
                *cached = None;
                Err(e)
            }
        }
    }
}
