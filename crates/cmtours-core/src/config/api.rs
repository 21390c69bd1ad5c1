//! Backend API configuration.

use serde::{Deserialize, Serialize};

/// Backend endpoint and transport configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the City Muscat Tours REST backend.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Timeout applied to every HTTP call, in seconds.
    ///
    /// This also bounds a hung refresh call, so concurrent callers waiting
    /// on a shared refresh are never blocked indefinitely.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    /// Path of the login endpoint.
    #[serde(default = "default_login_path")]
    pub login_path: String,
    /// Path of the registration endpoint.
    #[serde(default = "default_register_path")]
    pub register_path: String,
    /// Path of the token refresh endpoint.
    #[serde(default = "default_refresh_path")]
    pub refresh_path: String,
    /// Path of the logout endpoint.
    #[serde(default = "default_logout_path")]
    pub logout_path: String,
    /// Path of the authenticated profile endpoint.
    #[serde(default = "default_me_path")]
    pub me_path: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout(),
            login_path: default_login_path(),
            register_path: default_register_path(),
            refresh_path: default_refresh_path(),
            logout_path: default_logout_path(),
            me_path: default_me_path(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.citymuscattours.com/api".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_login_path() -> String {
    "/auth/login".to_string()
}

fn default_register_path() -> String {
    "/auth/register".to_string()
}

fn default_refresh_path() -> String {
    "/auth/refresh".to_string()
}

fn default_logout_path() -> String {
    "/auth/logout".to_string()
}

fn default_me_path() -> String {
    "/auth/me".to_string()
}
