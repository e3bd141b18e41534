//! Output formatting module for CLI

pub mod json;
mod lite;
mod terminal;

pub use json::JsonOutput;
pub use lite::LiteOutput;
pub use terminal::TerminalOutput;

use crate::error::ResScanError;
use crate::rules::ScanOutcome;

/// Trait for rendering report output
pub trait ReportRenderer {
    fn render_report(&self, outcome: &ScanOutcome) -> Result<String, ResScanError>;
}
