//! CLI command definitions and dispatch.

pub mod account;
pub mod auth;
pub mod request;
pub mod tokens;

use std::sync::Arc;

use clap::{Parser, Subcommand};

use cmtours_client::ApiClient;
use cmtours_core::config::AppConfig;
use cmtours_core::error::ApiError;
use cmtours_store::{FileCredentialStore, TokenStore};

use crate::output::OutputFormat;

/// City Muscat Tours — booking API client
#[derive(Debug, Parser)]
#[command(name = "cmtours", version, about, long_about = None)]
pub struct Cli {
    /// Configuration profile (merged over config/default.toml)
    #[arg(short, long, default_value = "default")]
    pub profile: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Log in and store the session tokens
    Login(auth::LoginArgs),
    /// Register a new account
    Register(auth::RegisterArgs),
    /// Log out and clear the stored session
    Logout,
    /// Force one token refresh cycle
    Refresh,
    /// Show the authenticated profile
    Whoami,
    /// Inspect or clear the stored tokens
    Tokens(tokens::TokensArgs),
    /// Perform an authenticated GET against an endpoint
    Get(request::GetArgs),
    /// Perform an authenticated POST against an endpoint
    Post(request::PostArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self, config: &AppConfig) -> Result<(), ApiError> {
        match &self.command {
            Commands::Login(args) => auth::login(args, config, self.format).await,
            Commands::Register(args) => auth::register(args, config, self.format).await,
            Commands::Logout => auth::logout(config).await,
            Commands::Refresh => auth::refresh(config).await,
            Commands::Whoami => account::whoami(config, self.format).await,
            Commands::Tokens(args) => tokens::execute(args, config, self.format).await,
            Commands::Get(args) => request::get(args, config, self.format).await,
            Commands::Post(args) => request::post(args, config, self.format).await,
        }
    }
}

/// Helper: build a client from loaded configuration
pub fn build_client(config: &AppConfig) -> Result<ApiClient, ApiError> {
    let store = Arc::new(
        FileCredentialStore::new(&config.credentials.path)
            .map_err(|e| ApiError::storage(format!("Failed to open credential store: {e}")))?,
    );
    let tokens = Arc::new(TokenStore::new(store, config.credentials.clone()));
    ApiClient::new(config.api.clone(), tokens)
}
