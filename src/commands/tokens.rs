//! Token inspection CLI commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use cmtours_core::config::AppConfig;
use cmtours_core::error::ApiError;
use cmtours_store::expiry;

use crate::output::{self, OutputFormat};

/// Arguments for token commands
#[derive(Debug, Args)]
pub struct TokensArgs {
    /// Token subcommand
    #[command(subcommand)]
    pub command: TokensCommand,
}

/// Token subcommands
#[derive(Debug, Subcommand)]
pub enum TokensCommand {
    /// Show the state of the stored credentials
    Status,
    /// Clear stored credentials for a given reason
    Clear {
        /// Reason passed to the guarded clearing logic
        #[arg(short, long, default_value = "logout")]
        reason: String,
    },
}

/// Credential display row for table output
#[derive(Debug, Serialize, Tabled)]
struct CredentialRow {
    /// Credential name
    credential: String,
    /// Whether a value is stored
    present: String,
    /// Lifecycle state
    state: String,
}

/// Execute token commands
pub async fn execute(
    args: &TokensArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), ApiError> {
    let client = super::build_client(config)?;
    let tokens = client.tokens();

    match &args.command {
        TokensCommand::Status => {
            let access = tokens.access_token();
            let refresh = tokens.refresh_token();

            let access_state = match access.as_deref() {
                None => "absent".to_string(),
                Some(token) if expiry::is_locally_expired(Some(token)) => {
                    "locally expired".to_string()
                }
                Some(token) => match expiry::decoded_expiry_ms(token) {
                    Some(expiry_ms) => format!("valid until {}", expiry_ms / 1000),
                    None => "valid".to_string(),
                },
            };

            let rows = vec![
                CredentialRow {
                    credential: "access token".to_string(),
                    present: yes_no(access.is_some()),
                    state: access_state,
                },
                CredentialRow {
                    credential: "refresh token".to_string(),
                    present: yes_no(refresh.is_some()),
                    state: "opaque".to_string(),
                },
                CredentialRow {
                    credential: "refresh disabled".to_string(),
                    present: yes_no(tokens.refresh_disabled()),
                    state: if tokens.refresh_disabled() {
                        "refresh calls are skipped".to_string()
                    } else {
                        "refresh available".to_string()
                    },
                },
            ];

            output::print_list(&rows, format);
        }
        TokensCommand::Clear { reason } => {
            tokens.clear_both_tokens(reason);
            if tokens.refresh_token().is_some() {
                output::print_warning(
                    "Refresh token kept: the reason did not confirm it is invalid",
                );
            } else {
                output::print_success("Credentials cleared");
            }
        }
    }

    Ok(())
}

fn yes_no(value: bool) -> String {
    if value { "yes" } else { "no" }.to_string()
}
