//! JSON formatter for resolution reports.

use crate::cli::Report;
use crate::error::CliError;

pub struct JsonFormatter;

pub fn render(report: &Report) -> Result<String, CliError> {
    Ok(serde_json::to_string_pretty(report)?)
}
