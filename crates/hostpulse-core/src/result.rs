//! Convenience result type alias for HostPulse.

use crate::error::AppError;

/// A specialized `Result` type for HostPulse operations.
pub type AppResult<T> = Result<T, AppError>;
