//! Credential storage configuration.

use serde::{Deserialize, Serialize};

/// Credential persistence configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialConfig {
    /// Path of the JSON credentials file used by the file-backed store.
    #[serde(default = "default_path")]
    pub path: String,
    /// Storage key under which the access token is persisted.
    #[serde(default = "default_access_token_key")]
    pub access_token_key: String,
    /// Storage key under which the refresh token is persisted.
    #[serde(default = "default_refresh_token_key")]
    pub refresh_token_key: String,
    /// Storage key under which the refresh-disabled flag is persisted.
    #[serde(default = "default_refresh_disabled_key")]
    pub refresh_disabled_key: String,
    /// Maximum write attempts before a save is treated as failed.
    #[serde(default = "default_write_attempts")]
    pub write_attempts: u32,
}

impl Default for CredentialConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
            access_token_key: default_access_token_key(),
            refresh_token_key: default_refresh_token_key(),
            refresh_disabled_key: default_refresh_disabled_key(),
            write_attempts: default_write_attempts(),
        }
    }
}

fn default_path() -> String {
    ".cmtours/credentials.json".to_string()
}

fn default_access_token_key() -> String {
    "citymuscattours_token".to_string()
}

fn default_refresh_token_key() -> String {
    "citymuscattours_refresh_token".to_string()
}

fn default_refresh_disabled_key() -> String {
    "refresh_disabled".to_string()
}

fn default_write_attempts() -> u32 {
    3
}
