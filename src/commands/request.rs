//! Generic request passthrough CLI commands.

use clap::Args;
use serde_json::Value;

use cmtours_core::config::AppConfig;
use cmtours_core::error::ApiError;

use crate::output::{self, OutputFormat};

/// Arguments for the get command
#[derive(Debug, Args)]
pub struct GetArgs {
    /// Endpoint path, e.g. /bookings
    pub endpoint: String,

    /// Send the request without requiring a stored session
    #[arg(long)]
    pub anonymous: bool,
}

/// Arguments for the post command
#[derive(Debug, Args)]
pub struct PostArgs {
    /// Endpoint path, e.g. /bookings
    pub endpoint: String,

    /// JSON request body
    #[arg(short, long, default_value = "{}")]
    pub body: String,

    /// Send the request without requiring a stored session
    #[arg(long)]
    pub anonymous: bool,
}

/// Execute the get command
pub async fn get(args: &GetArgs, config: &AppConfig, format: OutputFormat) -> Result<(), ApiError> {
    let client = super::build_client(config)?;
    let body: Value = client.get(&args.endpoint, !args.anonymous).await?;
    output::print_payload(&body, format);
    Ok(())
}

/// Execute the post command
pub async fn post(
    args: &PostArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), ApiError> {
    let client = super::build_client(config)?;
    let payload: Value = serde_json::from_str(&args.body)
        .map_err(|e| ApiError::validation(format!("Request body is not valid JSON: {e}")))?;
    let body: Value = client.post(&args.endpoint, payload, !args.anonymous).await?;
    output::print_payload(&body, format);
    Ok(())
}
