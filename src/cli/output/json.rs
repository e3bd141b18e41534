//! JSON output formatting

use super::ReportRenderer;
use crate::error::ResScanError;
use crate::rules::ScanOutcome;

/// Verbose result document, the same shape as the saved result file
pub struct JsonOutput;

impl JsonOutput {
    pub fn new() -> Self {
        Self
    }
}

impl Default for JsonOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportRenderer for JsonOutput {
    fn render_report(&self, outcome: &ScanOutcome) -> Result<String, ResScanError> {
        outcome.result.serialize_verbose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::RuleMatch;

    #[test]
    fn test_render_is_parseable_result() {
        let mut outcome = ScanOutcome::default();
        let mut rule_match = RuleMatch::new("Naming", "", 3);
        rule_match.add_unique("/Game/SK_Hero");
        outcome.result.push(rule_match);

        let rendered = JsonOutput::new().render_report(&outcome).unwrap();
        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();

        assert_eq!(value["matched"][0]["rule_id"], 3);
        assert_eq!(value["matched"][0]["matched_items"][0], "/Game/SK_Hero");
        assert_eq!(value["record_committer"], false);
    }
}
