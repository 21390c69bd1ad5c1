//! Result alias used across the client crates.

use crate::error::ApiError;

/// Convenience alias for results carrying [`ApiError`].
pub type ApiResult<T> = Result<T, ApiError>;
