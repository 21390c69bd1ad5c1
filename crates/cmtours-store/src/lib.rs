//! # cmtours-store
//!
//! Credential persistence for the City Muscat Tours client: the
//! [`CredentialStore`] provider trait, file-backed and in-memory providers,
//! local token expiry inspection, and the [`TokenStore`] with read-verified
//! writes and guarded clearing.
//!
//! The store deliberately errs on the side of keeping credentials: the only
//! operations that destroy the refresh token require a reason string that
//! unambiguously confirms the backend declared it dead.

pub mod expiry;
pub mod file;
pub mod memory;
pub mod provider;
pub mod tokens;

pub use expiry::{decoded_expiry_ms, is_locally_expired, is_locally_expired_at};
pub use file::FileCredentialStore;
pub use memory::MemoryCredentialStore;
pub use provider::{CredentialStore, StoreError};
pub use tokens::TokenStore;
