//! Shared harness for client integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;

use cmtours_client::ApiClient;
use cmtours_core::config::api::ApiConfig;
use cmtours_core::config::credentials::CredentialConfig;
use cmtours_store::{MemoryCredentialStore, TokenStore};

/// Build an unsigned three-segment token expiring at the given offset from
/// now (seconds; negative means already expired).
pub fn make_token(expires_in_seconds: i64) -> String {
    let exp = Utc::now().timestamp() + expires_in_seconds;
    let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(format!(r#"{{"sub":"user-1","exp":{exp}}}"#));
    format!("{header}.{payload}.testsignature")
}

/// A token comfortably outside the 60-second local expiry margin.
pub fn fresh_token() -> String {
    make_token(3600)
}

/// A token the client will consider locally expired.
pub fn expired_token() -> String {
    make_token(-3600)
}

/// Client wired to an in-memory store against the given base URL.
pub fn make_client(base_url: &str) -> (ApiClient, Arc<TokenStore>) {
    let store = Arc::new(MemoryCredentialStore::new());
    let tokens = Arc::new(TokenStore::new(store, CredentialConfig::default()));
    let config = ApiConfig {
        base_url: base_url.to_string(),
        ..ApiConfig::default()
    };
    let client = ApiClient::new(config, tokens.clone()).expect("failed to build client");
    (client, tokens)
}

/// Bearer header value for a token.
pub fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}
