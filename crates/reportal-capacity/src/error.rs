//! Capacity management errors.

use reportal_core::error::AppError;
use reportal_entity::capacity::IncompleteSettings;

/// Failures raised by the capacity adapter and token cache.
///
/// None of these ever escape the controller; they are logged and the
/// decision is deferred to the next reconciliation tick.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CapacityError {
    /// Settings lack a required addressing field.
    #[error("capacity settings incomplete: missing `{field}`")]
    ConfigurationIncomplete {
        /// The first missing field.
        field: &'static str,
    },

    /// The management API was unreachable or refused the request.
    #[error("capacity adapter unavailable: {0}")]
    AdapterUnavailable(String),

    /// A bearer token could not be obtained.
    #[error("token acquisition failed: {0}")]
    Token(String),
}

/// Result alias for capacity operations.
pub type CapacityResult<T> = Result<T, CapacityError>;

impl From<IncompleteSettings> for CapacityError {
    fn from(err: IncompleteSettings) -> Self {
        Self::ConfigurationIncomplete { field: err.0 }
    }
}

impl From<CapacityError> for AppError {
    fn from(err: CapacityError) -> Self {
        match &err {
            CapacityError::ConfigurationIncomplete { .. } => {
                AppError::configuration(err.to_string())
            }
            CapacityError::AdapterUnavailable(_) => AppError::external_service(err.to_string()),
            CapacityError::Token(_) => AppError::service_unavailable(err.to_string()),
        }
    }
}
