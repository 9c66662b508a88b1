//! Output formatters for resolution reports.

pub mod human;
pub mod json;

pub use human::HumanFormatter;
pub use json::JsonFormatter;

use crate::cli::Report;
use crate::error::CliError;

/// Trait for formatting resolution reports
pub trait Formatter {
    /// Render the report as it will be printed
    fn render(&self, report: &Report) -> Result<String, CliError>;

    /// Print the report to stdout
    fn format(&self, report: &Report) -> Result<(), CliError> {
        println!("{}", self.render(report)?);
        Ok(())
    }
}

impl Formatter for HumanFormatter {
    fn render(&self, report: &Report) -> Result<String, CliError> {
        Ok(human::render(report))
    }
}

impl Formatter for JsonFormatter {
    fn render(&self, report: &Report) -> Result<String, CliError> {
        json::render(report)
    }
}
