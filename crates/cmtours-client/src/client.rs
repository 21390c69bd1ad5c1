//! The authenticated request client.
//!
//! The request pipeline lets the server stay the final arbiter of token
//! validity: local expiry only triggers an optimistic refresh, a 401 gets
//! exactly one refresh-and-retry cycle, and only a message classified as a
//! genuine authentication failure ends the session. Validation and
//! permission failures that happen to arrive as 401s pass through with all
//! credentials intact.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use cmtours_core::config::api::ApiConfig;
use cmtours_core::{ApiError, ApiResult};
use cmtours_store::{TokenStore, expiry};

use crate::classify::{UnauthorizedKind, classify_unauthorized};
use crate::refresh::RefreshCoordinator;
use crate::response;

/// A failed response, read and parsed once so it can be classified and
/// surfaced without re-reading the body.
#[derive(Debug)]
struct Failure {
    status: StatusCode,
    content_type: Option<String>,
    body: String,
    message: Option<String>,
    validation_errors: Option<Value>,
}

/// Client for the City Muscat Tours REST backend.
///
/// Cheap to clone; clones share the token store and the refresh
/// coordinator, so concurrent requests from any clone share one
/// outstanding refresh call.
#[derive(Debug, Clone)]
pub struct ApiClient {
    /// Underlying HTTP client, bounded by the configured timeout.
    http: reqwest::Client,
    /// Endpoint configuration.
    config: ApiConfig,
    /// Durable token persistence.
    tokens: Arc<TokenStore>,
    /// Single-flight refresh gate.
    refresher: Arc<RefreshCoordinator>,
}

impl ApiClient {
    /// Create a client from configuration and a token store.
    pub fn new(config: ApiConfig, tokens: Arc<TokenStore>) -> ApiResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| ApiError::configuration(format!("Failed to build HTTP client: {e}")))?;

        let refresh_url = join_url(&config.base_url, &config.refresh_path);
        let refresher = Arc::new(RefreshCoordinator::new(http.clone(), refresh_url));

        Ok(Self {
            http,
            config,
            tokens,
            refresher,
        })
    }

    /// The token store backing this client.
    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    /// Perform a request against the backend.
    ///
    /// Attaches the stored bearer token when one exists, proactively
    /// refreshes a locally expired token, and retries once after a 401.
    /// When `require_auth` is set and no token is stored, fails fast with
    /// an authentication-required error without touching the network.
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<Value>,
        require_auth: bool,
    ) -> ApiResult<T> {
        let url = join_url(&self.config.base_url, endpoint);
        let auth_endpoint = self.is_auth_endpoint(endpoint);

        let mut token = self.tokens.access_token();

        // Optimistic pre-flight refresh. A failure here is not an error:
        // the stale token is sent anyway and the server decides.
        if !auth_endpoint
            && let Some(current) = token.clone()
            && expiry::is_locally_expired(Some(&current))
        {
            debug!(endpoint, "access token locally expired; refreshing before request");
            match self.refresher.refresh(&self.tokens, Some(&current)).await {
                Some(fresh) => token = Some(fresh),
                None => {
                    debug!(endpoint, "refresh yielded no new token; proceeding with stale token");
                }
            }
        }

        if token.is_none() && require_auth {
            return Err(ApiError::authentication_required(format!(
                "Request to {endpoint} requires authentication but no token is stored"
            )));
        }

        let response = self
            .send(&method, &url, body.as_ref(), token.as_deref())
            .await?;

        if response.status() == StatusCode::UNAUTHORIZED
            && !auth_endpoint
            && let Some(stale) = token
        {
            return self
                .recover_unauthorized(&method, &url, endpoint, body.as_ref(), &stale, response)
                .await;
        }

        self.finish(endpoint, response).await
    }

    /// GET shorthand.
    pub async fn get<T: DeserializeOwned>(&self, endpoint: &str, require_auth: bool) -> ApiResult<T> {
        self.request(Method::GET, endpoint, None, require_auth).await
    }

    /// POST shorthand.
    pub async fn post<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: Value,
        require_auth: bool,
    ) -> ApiResult<T> {
        self.request(Method::POST, endpoint, Some(body), require_auth)
            .await
    }

    /// Log in with email and password, persisting the returned tokens.
    ///
    /// Returns the response payload (user profile and any extras) for the
    /// caller to display.
    pub async fn login(&self, email: &str, password: &str) -> ApiResult<Value> {
        let payload = serde_json::json!({ "email": email, "password": password });
        let body: Value = self
            .request(Method::POST, &self.config.login_path, Some(payload), false)
            .await?;
        self.store_token_pair(&body);
        Ok(body)
    }

    /// Register a new account, persisting any returned tokens.
    pub async fn register(&self, name: &str, email: &str, password: &str) -> ApiResult<Value> {
        let payload = serde_json::json!({ "name": name, "email": email, "password": password });
        let body: Value = self
            .request(Method::POST, &self.config.register_path, Some(payload), false)
            .await?;
        self.store_token_pair(&body);
        Ok(body)
    }

    /// Log out: best-effort notification to the backend, then local
    /// clearing of both tokens.
    pub async fn logout(&self) -> ApiResult<()> {
        if self.tokens.access_token().is_some() {
            let result: ApiResult<Value> = self
                .request(Method::POST, &self.config.logout_path, None, false)
                .await;
            if let Err(e) = result {
                // Local logout proceeds regardless; the session is being
                // discarded either way.
                warn!(error = %e, "backend logout call failed");
            }
        }
        self.tokens.clear_both_tokens("logout");
        Ok(())
    }

    /// Fetch the authenticated profile.
    pub async fn me(&self) -> ApiResult<Value> {
        self.get(&self.config.me_path, true).await
    }

    /// Force one refresh cycle. Returns whether a new access token was
    /// minted.
    pub async fn refresh_session(&self) -> bool {
        let observed = self.tokens.access_token();
        self.refresher
            .refresh(&self.tokens, observed.as_deref())
            .await
            .is_some()
    }

    /// Whether an endpoint belongs to the authentication flow itself.
    ///
    /// Auth endpoints never trigger refresh cycles: a 401 from login is a
    /// wrong password, not a stale session.
    fn is_auth_endpoint(&self, endpoint: &str) -> bool {
        [
            &self.config.login_path,
            &self.config.register_path,
            &self.config.refresh_path,
        ]
        .iter()
        .any(|path| endpoint.starts_with(path.as_str()))
    }

    async fn send(
        &self,
        method: &Method,
        url: &str,
        body: Option<&Value>,
        bearer: Option<&str>,
    ) -> ApiResult<reqwest::Response> {
        let mut request = self.http.request(method.clone(), url);
        if let Some(body) = body {
            request = request.json(body);
        }
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }

        request.send().await.map_err(|e| {
            ApiError::with_source(
                cmtours_core::ErrorKind::BackendUnreachable,
                format!(
                    "Could not reach the backend at {url}: {e}. Check that the API server is \
                     running, that the base URL is correct, and that nothing (network, DNS, \
                     CORS in browser contexts) is blocking the connection."
                ),
                e,
            )
        })
    }

    /// One refresh-and-retry cycle after a 401 on a non-auth endpoint.
    async fn recover_unauthorized<T: DeserializeOwned>(
        &self,
        method: &Method,
        url: &str,
        endpoint: &str,
        body: Option<&Value>,
        stale_token: &str,
        response: reqwest::Response,
    ) -> ApiResult<T> {
        let failure = self.read_failure(response).await?;
        debug!(endpoint, message = failure.message.as_deref().unwrap_or(""), "request returned 401");

        match self.refresher.refresh(&self.tokens, Some(stale_token)).await {
            Some(fresh) => {
                let retry = self.send(method, url, body, Some(&fresh)).await?;
                if retry.status() == StatusCode::UNAUTHORIZED {
                    let retry_failure = self.read_failure(retry).await?;
                    Err(self.settle_unauthorized(endpoint, retry_failure))
                } else {
                    self.finish(endpoint, retry).await
                }
            }
            None => Err(self.settle_unauthorized(endpoint, failure)),
        }
    }

    /// Decide what a final 401 means. Only a confirmed authentication
    /// failure clears the access token; everything else passes through
    /// verbatim with credentials intact.
    fn settle_unauthorized(&self, endpoint: &str, failure: Failure) -> ApiError {
        let message = failure.message.clone().unwrap_or_default();
        match classify_unauthorized(&message) {
            UnauthorizedKind::Auth => {
                self.tokens
                    .clear_access_token(&format!("session expired: {message}"));
                let shown = if message.is_empty() {
                    "Session expired".to_string()
                } else {
                    message
                };
                ApiError::session_expired(shown)
            }
            UnauthorizedKind::RefreshToken => ApiError::refresh_token(message),
            UnauthorizedKind::Other => self.failure_to_error(endpoint, failure),
        }
    }

    /// Read a failed response into parts for classification.
    async fn read_failure(&self, response: reqwest::Response) -> ApiResult<Failure> {
        let status = response.status();
        let content_type = header_string(&response, reqwest::header::CONTENT_TYPE);
        let body = response.text().await.map_err(|e| {
            ApiError::with_source(
                cmtours_core::ErrorKind::Internal,
                format!("Failed to read response body: {e}"),
                e,
            )
        })?;

        let parsed: Option<Value> = serde_json::from_str(&body).ok();
        let message = parsed.as_ref().and_then(response::extract_message);
        let validation_errors = parsed.as_ref().and_then(response::extract_validation_errors);

        Ok(Failure {
            status,
            content_type,
            body,
            message,
            validation_errors,
        })
    }

    /// Turn a terminal response into the caller's result: JSON payloads
    /// deserialize, HTML bodies become backend-fault errors even on 2xx.
    async fn finish<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        response: reqwest::Response,
    ) -> ApiResult<T> {
        let status = response.status();
        if !status.is_success() {
            let failure = self.read_failure(response).await?;
            return Err(self.failure_to_error(endpoint, failure));
        }

        let content_type = header_string(&response, reqwest::header::CONTENT_TYPE);
        let body = response.text().await.map_err(|e| {
            ApiError::with_source(
                cmtours_core::ErrorKind::Internal,
                format!("Failed to read response body: {e}"),
                e,
            )
        })?;

        if response::looks_like_html(content_type.as_deref(), &body) {
            return Err(ApiError::backend_error_page(format!(
                "Backend returned an HTML page instead of JSON for {endpoint}: {}",
                response::snippet(&body)
            )));
        }

        // Empty bodies (204s, bare 200s) deserialize as JSON null.
        let source = if body.trim().is_empty() { "null" } else { &body };
        serde_json::from_str(source).map_err(|e| {
            ApiError::with_source(
                cmtours_core::ErrorKind::Serialization,
                format!("Failed to parse response from {endpoint}: {e}"),
                e,
            )
        })
    }

    /// Map a parsed failure to a typed error, preserving the server's
    /// message verbatim where one exists.
    fn failure_to_error(&self, endpoint: &str, failure: Failure) -> ApiError {
        if response::looks_like_html(failure.content_type.as_deref(), &failure.body) {
            return ApiError::backend_error_page(format!(
                "Backend rendered an error page (HTTP {status}) for {endpoint}: {snippet}",
                status = failure.status.as_u16(),
                snippet = response::snippet(&failure.body),
            ));
        }

        let message = failure.message.clone().unwrap_or_else(|| {
            format!(
                "Request to {endpoint} failed with status {}",
                failure.status.as_u16()
            )
        });

        let lowered = message.to_lowercase();
        let kind = if failure.status == StatusCode::FORBIDDEN
            || lowered.contains("permission")
            || lowered.contains("insufficient")
        {
            cmtours_core::ErrorKind::Permission
        } else if failure.status.is_server_error() {
            cmtours_core::ErrorKind::Internal
        } else {
            cmtours_core::ErrorKind::Validation
        };

        let mut error = ApiError::new(kind, message);
        if let Some(map) = failure.validation_errors {
            error = error.with_validation_errors(map);
        }
        error
    }

    fn store_token_pair(&self, body: &Value) {
        let (access, refresh) = response::extract_token_pair(body);
        if let Some(access) = access {
            if !self.tokens.save_access_token(&access) {
                warn!("access token from auth response could not be persisted");
            }
        }
        if let Some(refresh) = refresh {
            if !self.tokens.save_refresh_token(&refresh) {
                warn!("refresh token from auth response could not be persisted");
            }
        }
    }
}

fn header_string(response: &reqwest::Response, name: reqwest::header::HeaderName) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(String::from)
}

fn join_url(base: &str, endpoint: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        endpoint.trim_start_matches('/')
    )
}
