//! Client configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section.

pub mod api;
pub mod credentials;
pub mod logging;

use serde::{Deserialize, Serialize};

use self::api::ApiConfig;
use self::credentials::CredentialConfig;
use self::logging::LoggingConfig;

use crate::error::ApiError;

/// Root client configuration.
///
/// This struct is the top-level deserialization target for the merged
/// TOML configuration files (default.toml + profile overlay).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Backend API settings.
    #[serde(default)]
    pub api: ApiConfig,
    /// Credential storage settings.
    #[serde(default)]
    pub credentials: CredentialConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges the default configuration with a profile-specific overlay
    /// and environment variables prefixed with `CMTOURS_`.
    pub fn load(profile: &str) -> Result<Self, ApiError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{profile}")).required(false))
            .add_source(
                config::Environment::with_prefix("CMTOURS")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| ApiError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| ApiError::configuration(format!("Failed to deserialize config: {e}")))
    }
}
