//! # cmtours-core
//!
//! Core crate for the City Muscat Tours client. Contains configuration
//! schemas and the unified error system.
//!
//! This crate has **no** internal dependencies on other cmtours crates.

pub mod config;
pub mod error;
pub mod result;

pub use error::{ApiError, ErrorKind};
pub use result::ApiResult;
