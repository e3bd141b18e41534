//! Lite text output

use super::ReportRenderer;
use crate::error::ResScanError;
use crate::rules::ScanOutcome;

pub struct LiteOutput;

impl LiteOutput {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LiteOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportRenderer for LiteOutput {
    fn render_report(&self, outcome: &ScanOutcome) -> Result<String, ResScanError> {
        Ok(outcome.result.serialize_lite())
    }
}
