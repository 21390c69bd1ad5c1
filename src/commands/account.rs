//! Account CLI commands.

use cmtours_core::config::AppConfig;
use cmtours_core::error::ApiError;

use crate::output::{self, OutputFormat};

/// Execute the whoami command
pub async fn whoami(config: &AppConfig, format: OutputFormat) -> Result<(), ApiError> {
    let client = super::build_client(config)?;
    let profile = client.me().await?;
    output::print_payload(&profile, format);
    Ok(())
}
