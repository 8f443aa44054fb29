//! Management API credential configuration.

use serde::{Deserialize, Serialize};

/// Credentials used to obtain a bearer token for the management API.
///
/// Either `bearer_token` is supplied externally, or the client-credentials
/// triple (`tenant_id`, `client_id`, `client_secret`) is configured.
#[derive(Clone, Serialize, Deserialize)]
pub struct AzureConfig {
    /// OAuth2 authority base URL.
    #[serde(default = "default_authority")]
    pub authority: String,
    /// Directory (tenant) ID.
    #[serde(default)]
    pub tenant_id: Option<String>,
    /// Application (client) ID.
    #[serde(default)]
    pub client_id: Option<String>,
    /// Client secret.
    #[serde(default)]
    pub client_secret: Option<String>,
    /// Externally supplied bearer token; takes precedence when set.
    #[serde(default)]
    pub bearer_token: Option<String>,
    /// Refresh a cached token this many seconds before it expires.
    #[serde(default = "default_refresh_margin")]
    pub token_refresh_margin_seconds: u64,
}

impl Default for AzureConfig {
    fn default() -> Self {
        Self {
            authority: default_authority(),
            tenant_id: None,
            client_id: None,
            client_secret: None,
            bearer_token: None,
            token_refresh_margin_seconds: default_refresh_margin(),
        }
    }
}

impl AzureConfig {
    /// Whether the full client-credentials triple is present.
    pub fn has_client_credentials(&self) -> bool {
        [&self.tenant_id, &self.client_id, &self.client_secret]
            .iter()
            .all(|v| v.as_deref().is_some_and(|s| !s.is_empty()))
    }
}

impl std::fmt::Debug for AzureConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureConfig")
            .field("authority", &self.authority)
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "****"))
            .field("bearer_token", &self.bearer_token.as_ref().map(|_| "****"))
            .field(
                "token_refresh_margin_seconds",
                &self.token_refresh_margin_seconds,
            )
            .finish()
    }
}

fn default_authority() -> String {
    "https://login.microsoftonline.com".to_string()
}

fn default_refresh_margin() -> u64 {
    60
}
