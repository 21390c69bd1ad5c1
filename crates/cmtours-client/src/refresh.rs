//! Single-flight coordination of token refresh calls.
//!
//! Every failure path here resolves in favor of keeping credentials: only
//! two backend signals change stored state, a "refresh is not implemented"
//! signal (which sets the disabled flag) and an unambiguous "this refresh
//! token is dead" message (which goes through the guarded clear). Anything
//! ambiguous is logged and left alone, because it might be transient.

use reqwest::StatusCode;
use serde_json::{Value, json};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use cmtours_store::TokenStore;

use crate::response::{extract_message, extract_token_pair};

/// Coordinates refresh calls so concurrent callers share one outstanding
/// network request instead of issuing N parallel refreshes.
#[derive(Debug)]
pub struct RefreshCoordinator {
    /// HTTP client shared with the request client.
    http: reqwest::Client,
    /// Absolute URL of the refresh endpoint.
    refresh_url: String,
    /// Gate serializing refresh cycles within this process.
    gate: Mutex<()>,
}

impl RefreshCoordinator {
    /// Create a coordinator posting to the given refresh URL.
    pub fn new(http: reqwest::Client, refresh_url: String) -> Self {
        Self {
            http,
            refresh_url,
            gate: Mutex::new(()),
        }
    }

    /// Obtain a usable access token, refreshing at most once.
    ///
    /// `observed` is the access token the caller saw fail (or saw locally
    /// expire). Callers that queue behind an in-flight refresh re-check the
    /// store under the gate: if the stored token already differs from what
    /// they observed, that refresh cycle produced it and no second network
    /// call is made.
    ///
    /// Returns the fresh access token, or `None` when no new token could be
    /// minted. `None` never implies any credential was cleared.
    pub async fn refresh(&self, tokens: &TokenStore, observed: Option<&str>) -> Option<String> {
        if tokens.refresh_disabled() {
            debug!("refresh skipped: backend reported refresh unavailable");
            return None;
        }

        let _guard = self.gate.lock().await;

        if let Some(current) = tokens.access_token()
            && observed != Some(current.as_str())
        {
            debug!("refresh satisfied by a concurrent cycle");
            return Some(current);
        }

        let Some(refresh_token) = tokens.refresh_token() else {
            debug!("refresh skipped: no refresh token stored");
            return None;
        };

        self.call_refresh_endpoint(tokens, &refresh_token).await
    }

    async fn call_refresh_endpoint(
        &self,
        tokens: &TokenStore,
        refresh_token: &str,
    ) -> Option<String> {
        let response = match self
            .http
            .post(&self.refresh_url)
            .json(&json!({ "refreshToken": refresh_token }))
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "refresh request could not reach the backend");
                return None;
            }
        };

        let status = response.status();
        if status == StatusCode::NOT_FOUND || status == StatusCode::NOT_IMPLEMENTED {
            warn!(%status, "backend does not implement token refresh; disabling");
            tokens.set_refresh_disabled();
            return None;
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                warn!(error = %e, "failed to read refresh response body");
                return None;
            }
        };

        if !status.is_success() {
            self.handle_refresh_failure(tokens, status, &body);
            return None;
        }

        let parsed: Value = match serde_json::from_str(&body) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(error = %e, "refresh response was not valid JSON");
                return None;
            }
        };

        let (access, refresh) = extract_token_pair(&parsed);
        let Some(access) = access else {
            warn!("refresh response carried no recognizable token");
            return None;
        };

        if !tokens.save_access_token(&access) {
            warn!("refreshed access token could not be persisted; using it unsaved");
        }
        // The backend only rotates the refresh token sometimes. Its absence
        // from the response does not mean it was revoked.
        if let Some(refresh) = refresh {
            if !tokens.save_refresh_token(&refresh) {
                warn!("rotated refresh token could not be persisted");
            }
        }

        debug!("access token refreshed");
        Some(access)
    }

    fn handle_refresh_failure(&self, tokens: &TokenStore, status: StatusCode, body: &str) {
        let message = serde_json::from_str::<Value>(body)
            .ok()
            .and_then(|parsed| extract_message(&parsed))
            .unwrap_or_default();
        let lowered = message.to_lowercase();

        if status == StatusCode::UNAUTHORIZED && refresh_misconfigured(&lowered) {
            warn!(%message, "backend refresh mechanism is misconfigured; disabling");
            tokens.set_refresh_disabled();
            return;
        }

        if status == StatusCode::UNAUTHORIZED && refresh_token_rejected(&lowered) {
            warn!(%message, "backend confirmed the refresh token is invalid");
            tokens.clear_refresh_token(&message);
            return;
        }

        // Ambiguous failure: possibly transient, nothing is cleared.
        warn!(%status, %message, "refresh failed without a conclusive reason; keeping tokens");
    }
}

/// The refresh secret or mechanism is not set up on the backend.
fn refresh_misconfigured(message: &str) -> bool {
    message.contains("refresh token secret")
        || message.contains("not configured")
        || message.contains("misconfigur")
}

/// The backend unambiguously rejected this refresh token.
///
/// Must stay in sync with the phrases the guarded clear accepts, since the
/// raw message is passed through as the clearing reason.
fn refresh_token_rejected(message: &str) -> bool {
    message.contains("invalid refresh token")
        || message.contains("refresh token expired")
        || message.contains("refresh token signature")
}
