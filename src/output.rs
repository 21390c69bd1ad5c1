//! Output formatting for the cmtours CLI.

use serde::Serialize;
use tabled::{Table, Tabled};

/// Output format selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    #[default]
    Table,
    /// JSON output
    Json,
}

/// Print a list of rows in the selected format
pub fn print_list<T: Serialize + Tabled>(items: &[T], format: OutputFormat) {
    match format {
        OutputFormat::Table if items.is_empty() => println!("Nothing to show."),
        OutputFormat::Table => println!("{}", Table::new(items)),
        OutputFormat::Json => match serde_json::to_string_pretty(items) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("Failed to render JSON output: {}", e),
        },
    }
}

/// Print a JSON payload from the backend.
///
/// Table format renders top-level object fields as aligned key/value lines;
/// nested values and non-objects fall back to pretty-printed JSON.
pub fn print_payload(payload: &serde_json::Value, format: OutputFormat) {
    match format {
        OutputFormat::Table => match payload.as_object() {
            Some(fields) if !fields.is_empty() => {
                for (key, value) in fields {
                    let shown = match value.as_str() {
                        Some(text) => text.to_string(),
                        None => format!("{:#}", value),
                    };
                    println!("  {:<24} {}", format!("{}:", key), shown);
                }
            }
            _ => println!("{:#}", payload),
        },
        OutputFormat::Json => println!("{:#}", payload),
    }
}

/// Print a success message
pub fn print_success(msg: &str) {
    println!("✓ {}", msg);
}

/// Print a warning message
pub fn print_warning(msg: &str) {
    println!("⚠ {}", msg);
}
