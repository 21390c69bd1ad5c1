//! Credential store provider trait for pluggable persistence backends.

use thiserror::Error;

/// Errors raised by credential store backends.
///
/// [`StoreError::QuotaExceeded`] and [`StoreError::Disabled`] are fatal to a
/// write: the caller must not retry, because the backend has told it the
/// condition is not transient.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend rejected the write because its quota is exhausted.
    #[error("credential storage quota exceeded")]
    QuotaExceeded,
    /// The backend is disabled or read-only in this environment.
    #[error("credential storage is disabled")]
    Disabled,
    /// An I/O failure occurred.
    #[error("credential storage I/O failure: {0}")]
    Io(#[from] std::io::Error),
    /// The persisted document could not be serialized or parsed.
    #[error("credential storage serialization failure: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    /// Whether a write hitting this error must abort instead of retrying.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::QuotaExceeded | Self::Disabled)
    }
}

/// Trait for credential persistence backends (file, in-memory, keychain).
///
/// All values are stored as strings under string keys. Operations are
/// synchronous: storage never suspends, HTTP calls are the only suspension
/// points in the client.
pub trait CredentialStore: Send + Sync + std::fmt::Debug {
    /// Get a value by key. Returns `None` if the key does not exist.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Set a value. The caller is responsible for read-back verification.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Remove a key. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}
