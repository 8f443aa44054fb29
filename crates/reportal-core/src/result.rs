//! Convenience result type alias for Reportal.

use crate::error::AppError;

/// A specialized `Result` type for Reportal operations.
pub type AppResult<T> = Result<T, AppError>;
