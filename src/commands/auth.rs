//! Session CLI commands: login, register, logout, refresh.

use clap::Args;
use dialoguer::Password;

use cmtours_core::config::AppConfig;
use cmtours_core::error::ApiError;

use crate::output::{self, OutputFormat};

/// Arguments for the login command
#[derive(Debug, Args)]
pub struct LoginArgs {
    /// Account email
    #[arg(short, long)]
    pub email: String,

    /// Account password (prompted when omitted)
    #[arg(short, long)]
    pub password: Option<String>,
}

/// Arguments for the register command
#[derive(Debug, Args)]
pub struct RegisterArgs {
    /// Display name
    #[arg(short, long)]
    pub name: String,

    /// Account email
    #[arg(short, long)]
    pub email: String,

    /// Account password (prompted when omitted)
    #[arg(short, long)]
    pub password: Option<String>,
}

/// Execute the login command
pub async fn login(
    args: &LoginArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), ApiError> {
    let client = super::build_client(config)?;
    let password = resolve_password(args.password.as_deref())?;

    let body = client.login(&args.email, &password).await?;

    output::print_success(&format!("Logged in as {}", args.email));
    if let Some(user) = body.get("user") {
        output::print_payload(user, format);
    }
    Ok(())
}

/// Execute the register command
pub async fn register(
    args: &RegisterArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), ApiError> {
    let client = super::build_client(config)?;
    let password = resolve_password(args.password.as_deref())?;

    let body = client.register(&args.name, &args.email, &password).await?;

    output::print_success(&format!("Registered {}", args.email));
    if let Some(user) = body.get("user") {
        output::print_payload(user, format);
    }
    Ok(())
}

/// Execute the logout command
pub async fn logout(config: &AppConfig) -> Result<(), ApiError> {
    let client = super::build_client(config)?;
    client.logout().await?;
    output::print_success("Logged out");
    Ok(())
}

/// Execute the refresh command
pub async fn refresh(config: &AppConfig) -> Result<(), ApiError> {
    let client = super::build_client(config)?;
    if client.refresh_session().await {
        output::print_success("Access token refreshed");
    } else {
        output::print_warning("No new access token was issued");
    }
    Ok(())
}

fn resolve_password(given: Option<&str>) -> Result<String, ApiError> {
    match given {
        Some(password) => Ok(password.to_string()),
        None => Password::new()
            .with_prompt("Password")
            .interact()
            .map_err(|e| ApiError::internal(format!("Failed to read password: {e}"))),
    }
}
