//! Token persistence with read-verified writes and guarded clearing.
//!
//! The guiding invariant is "optimistic keep, pessimistic clear": a save is
//! retried and verified because the underlying storage may be unreliable,
//! but a credential is only destroyed when the reason for doing so quotes an
//! unambiguous backend confirmation. The refresh token in particular is the
//! one credential that can restore a session, so ambiguous failures never
//! remove it.

use std::sync::Arc;

use tracing::{debug, warn};

use cmtours_core::config::credentials::CredentialConfig;

use crate::expiry;
use crate::provider::CredentialStore;

/// Reasons that confirm the refresh token itself is dead.
///
/// `clear_refresh_token` only acts when the reason contains one of these.
const REFRESH_TOKEN_INVALID_PHRASES: &[&str] = &[
    "invalid refresh token",
    "refresh token expired",
    "refresh token signature",
    "backend confirmed invalid",
];

/// Reasons that confirm the whole session is over, refresh token included.
const SESSION_OVER_PHRASES: &[&str] = &["logout", "session expired"];

/// Durable, verified persistence for the access token, refresh token, and
/// the refresh-disabled flag.
#[derive(Debug, Clone)]
pub struct TokenStore {
    /// Backing credential store.
    store: Arc<dyn CredentialStore>,
    /// Storage keys and write policy.
    config: CredentialConfig,
}

impl TokenStore {
    /// Create a token store over the given backend.
    pub fn new(store: Arc<dyn CredentialStore>, config: CredentialConfig) -> Self {
        Self { store, config }
    }

    /// Save the access token. Returns `true` only when a read-back matched.
    pub fn save_access_token(&self, token: &str) -> bool {
        self.save_verified("access token", &self.config.access_token_key, token)
    }

    /// Save the refresh token. Returns `true` only when a read-back matched.
    pub fn save_refresh_token(&self, token: &str) -> bool {
        self.save_verified("refresh token", &self.config.refresh_token_key, token)
    }

    /// Read the stored access token.
    pub fn access_token(&self) -> Option<String> {
        self.read(&self.config.access_token_key)
    }

    /// Read the stored refresh token.
    pub fn refresh_token(&self) -> Option<String> {
        self.read(&self.config.refresh_token_key)
    }

    /// Remove the access token unconditionally.
    ///
    /// Always safe: the access token is the short-lived credential and a
    /// refresh can mint a new one.
    pub fn clear_access_token(&self, reason: &str) {
        debug!(reason, "clearing access token");
        if let Err(e) = self.store.remove(&self.config.access_token_key) {
            warn!(error = %e, "failed to remove access token from storage");
        }
    }

    /// Remove the refresh token, but only for a confirmed-invalid reason.
    ///
    /// Returns whether the token was actually cleared. Any reason that does
    /// not quote a backend confirmation is rejected: the refresh token is
    /// the one credential that can restore a session, and only the
    /// authority that issued it may declare it dead.
    pub fn clear_refresh_token(&self, reason: &str) -> bool {
        let lowered = reason.to_lowercase();
        let confirmed = REFRESH_TOKEN_INVALID_PHRASES
            .iter()
            .any(|phrase| lowered.contains(phrase));
        if !confirmed {
            warn!(
                reason,
                "refusing to clear refresh token: reason does not confirm it is invalid"
            );
            return false;
        }
        debug!(reason, "clearing refresh token");
        match self.store.remove(&self.config.refresh_token_key) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "failed to remove refresh token from storage");
                false
            }
        }
    }

    /// Clear the access token and, when the reason confirms the whole
    /// session is over, the refresh token too.
    pub fn clear_both_tokens(&self, reason: &str) {
        self.clear_access_token(reason);

        let lowered = reason.to_lowercase();
        let session_over = SESSION_OVER_PHRASES
            .iter()
            .any(|phrase| lowered.contains(phrase))
            || (lowered.contains("both")
                && (lowered.contains("invalid") || lowered.contains("expired")));
        if session_over {
            debug!(reason, "clearing refresh token with access token");
            if let Err(e) = self.store.remove(&self.config.refresh_token_key) {
                warn!(error = %e, "failed to remove refresh token from storage");
            }
        } else {
            warn!(
                reason,
                "kept refresh token: reason does not confirm both tokens are invalid"
            );
        }
    }

    /// Whether the backend has signalled that refresh is not available.
    pub fn refresh_disabled(&self) -> bool {
        self.read(&self.config.refresh_disabled_key).as_deref() == Some("true")
    }

    /// Persist the refresh-disabled flag.
    ///
    /// While set, the client skips refresh attempts entirely and relies on
    /// the existing access token until the backend rejects it outright.
    pub fn set_refresh_disabled(&self) {
        if let Err(e) = self.store.set(&self.config.refresh_disabled_key, "true") {
            warn!(error = %e, "failed to persist refresh-disabled flag");
        }
    }

    /// Clear the refresh-disabled flag.
    pub fn clear_refresh_disabled(&self) {
        if let Err(e) = self.store.remove(&self.config.refresh_disabled_key) {
            warn!(error = %e, "failed to clear refresh-disabled flag");
        }
    }

    /// Whether the stored access token is locally expired (or absent).
    pub fn access_token_locally_expired(&self) -> bool {
        expiry::is_locally_expired(self.access_token().as_deref())
    }

    fn read(&self, key: &str) -> Option<String> {
        match self.store.get(key) {
            Ok(value) => value.filter(|v| !v.is_empty()),
            Err(e) => {
                warn!(key, error = %e, "credential read failed");
                None
            }
        }
    }

    /// Write then read back and compare, retrying up to the configured
    /// attempt bound. Fatal storage conditions (quota exhausted, storage
    /// disabled) abort immediately: they are not transient.
    fn save_verified(&self, label: &str, key: &str, value: &str) -> bool {
        if value.is_empty() {
            warn!(label, "refusing to save empty credential");
            return false;
        }

        let attempts = self.config.write_attempts.max(1);
        for attempt in 1..=attempts {
            match self.store.set(key, value) {
                Ok(()) => {}
                Err(e) if e.is_fatal() => {
                    warn!(label, error = %e, "credential write aborted");
                    return false;
                }
                Err(e) => {
                    warn!(label, attempt, error = %e, "credential write failed");
                    continue;
                }
            }

            match self.store.get(key) {
                Ok(Some(read_back)) if read_back == value => {
                    if attempt > 1 {
                        debug!(label, attempt, "credential write verified after retry");
                    }
                    return true;
                }
                Ok(_) => {
                    warn!(label, attempt, "credential read-back did not match");
                }
                Err(e) => {
                    warn!(label, attempt, error = %e, "credential read-back failed");
                }
            }
        }

        warn!(label, attempts, "credential write never verified");
        false
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;
    use crate::memory::MemoryCredentialStore;
    use crate::provider::StoreError;

    fn make_store() -> TokenStore {
        TokenStore::new(
            Arc::new(MemoryCredentialStore::new()),
            CredentialConfig::default(),
        )
    }

    /// Store that swallows the first N writes, then behaves normally.
    #[derive(Debug)]
    struct FlakyStore {
        inner: MemoryCredentialStore,
        dropped_writes: AtomicU32,
    }

    impl FlakyStore {
        fn dropping(n: u32) -> Self {
            Self {
                inner: MemoryCredentialStore::new(),
                dropped_writes: AtomicU32::new(n),
            }
        }
    }

    impl CredentialStore for FlakyStore {
        fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
            let remaining = self.dropped_writes.load(Ordering::SeqCst);
            if remaining > 0 {
                self.dropped_writes.store(remaining - 1, Ordering::SeqCst);
                // Pretend the write succeeded without persisting anything.
                return Ok(());
            }
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> Result<(), StoreError> {
            self.inner.remove(key)
        }
    }

    /// Store whose writes always fail with a fatal condition.
    #[derive(Debug)]
    struct QuotaStore {
        inner: MemoryCredentialStore,
        writes: Mutex<u32>,
    }

    impl QuotaStore {
        fn new() -> Self {
            Self {
                inner: MemoryCredentialStore::new(),
                writes: Mutex::new(0),
            }
        }

        fn write_attempts(&self) -> u32 {
            *self.writes.lock().unwrap()
        }
    }

    impl CredentialStore for QuotaStore {
        fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
            self.inner.get(key)
        }

        fn set(&self, _key: &str, _value: &str) -> Result<(), StoreError> {
            *self.writes.lock().unwrap() += 1;
            Err(StoreError::QuotaExceeded)
        }

        fn remove(&self, key: &str) -> Result<(), StoreError> {
            self.inner.remove(key)
        }
    }

    #[test]
    fn test_save_and_read_roundtrip() {
        let tokens = make_store();
        assert!(tokens.save_access_token("aaa.bbb.ccc"));
        assert!(tokens.save_refresh_token("refresh-1"));
        assert_eq!(tokens.access_token(), Some("aaa.bbb.ccc".to_string()));
        assert_eq!(tokens.refresh_token(), Some("refresh-1".to_string()));
    }

    #[test]
    fn test_save_empty_fails_and_keeps_previous_value() {
        let tokens = make_store();
        assert!(tokens.save_access_token("previous"));
        assert!(!tokens.save_access_token(""));
        assert_eq!(tokens.access_token(), Some("previous".to_string()));
        assert!(!tokens.save_refresh_token(""));
        assert_eq!(tokens.refresh_token(), None);
    }

    #[test]
    fn test_save_retries_until_verified() {
        let flaky = Arc::new(FlakyStore::dropping(2));
        let tokens = TokenStore::new(flaky, CredentialConfig::default());
        assert!(tokens.save_access_token("tok"));
        assert_eq!(tokens.access_token(), Some("tok".to_string()));
    }

    #[test]
    fn test_save_gives_up_after_attempt_bound() {
        let flaky = Arc::new(FlakyStore::dropping(10));
        let tokens = TokenStore::new(flaky, CredentialConfig::default());
        assert!(!tokens.save_access_token("tok"));
        assert_eq!(tokens.access_token(), None);
    }

    #[test]
    fn test_quota_exceeded_aborts_without_retry() {
        let quota = Arc::new(QuotaStore::new());
        let tokens = TokenStore::new(quota.clone(), CredentialConfig::default());
        assert!(!tokens.save_access_token("tok"));
        assert_eq!(quota.write_attempts(), 1);
    }

    #[test]
    fn test_clear_access_token_is_unconditional() {
        let tokens = make_store();
        tokens.save_access_token("tok");
        tokens.clear_access_token("any reason at all");
        assert_eq!(tokens.access_token(), None);
    }

    #[test]
    fn test_clear_refresh_token_requires_confirmed_reason() {
        let tokens = make_store();
        tokens.save_refresh_token("keep-me");

        for ambiguous in ["", "network error", "401 unauthorized", "validation failed"] {
            assert!(!tokens.clear_refresh_token(ambiguous));
            assert_eq!(tokens.refresh_token(), Some("keep-me".to_string()));
        }

        assert!(tokens.clear_refresh_token("Invalid refresh token"));
        assert_eq!(tokens.refresh_token(), None);
    }

    #[test]
    fn test_clear_refresh_token_accepts_each_confirmed_phrase() {
        for reason in [
            "invalid refresh token",
            "Refresh token expired",
            "refresh token signature mismatch",
            "backend confirmed invalid",
        ] {
            let tokens = make_store();
            tokens.save_refresh_token("rt");
            assert!(tokens.clear_refresh_token(reason), "reason: {reason}");
            assert_eq!(tokens.refresh_token(), None);
        }
    }

    #[test]
    fn test_clear_both_on_logout() {
        let tokens = make_store();
        tokens.save_access_token("at");
        tokens.save_refresh_token("rt");
        tokens.clear_both_tokens("logout");
        assert_eq!(tokens.access_token(), None);
        assert_eq!(tokens.refresh_token(), None);
    }

    #[test]
    fn test_clear_both_with_ambiguous_reason_keeps_refresh() {
        let tokens = make_store();
        tokens.save_access_token("at");
        tokens.save_refresh_token("rt");
        tokens.clear_both_tokens("request failed");
        assert_eq!(tokens.access_token(), None);
        assert_eq!(tokens.refresh_token(), Some("rt".to_string()));
    }

    #[test]
    fn test_clear_both_on_dual_confirmation() {
        let tokens = make_store();
        tokens.save_access_token("at");
        tokens.save_refresh_token("rt");
        tokens.clear_both_tokens("both tokens are invalid");
        assert_eq!(tokens.refresh_token(), None);
    }

    #[test]
    fn test_refresh_disabled_flag_lifecycle() {
        let tokens = make_store();
        assert!(!tokens.refresh_disabled());
        tokens.set_refresh_disabled();
        assert!(tokens.refresh_disabled());
        tokens.clear_refresh_disabled();
        assert!(!tokens.refresh_disabled());
    }
}
