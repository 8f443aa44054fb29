//! Background worker configuration.

use serde::{Deserialize, Serialize};

/// Background worker configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Whether the reconciliation worker runs in this process.
    ///
    /// In a multi-instance deployment exactly one instance should enable it.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Six-field cron expression (with seconds) for the reconciliation job.
    #[serde(default = "default_reconcile_cron")]
    pub reconcile_cron: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            reconcile_cron: default_reconcile_cron(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_reconcile_cron() -> String {
    "0 */5 * * * *".to_string()
}
