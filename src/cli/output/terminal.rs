//! Terminal output formatting with colors

use colored::Colorize;

use super::ReportRenderer;
use crate::error::ResScanError;
use crate::rules::{RuleReadiness, ScanOutcome};

pub struct TerminalOutput;

impl TerminalOutput {
    pub fn new() -> Self {
        Self
    }

    fn format_header(&self, outcome: &ScanOutcome) -> String {
        let running = outcome.statuses.iter().filter(|s| s.runs()).count();
        format!(
            "\n{} v{}\n\n{} {} of {}\n{} {}\n",
            "resscan".cyan().bold(),
            env!("CARGO_PKG_VERSION"),
            "Rules:".dimmed(),
            running.to_string().white().bold(),
            outcome.statuses.len(),
            "Candidates:".dimmed(),
            outcome.candidates
        )
    }

    fn format_matches(&self, outcome: &ScanOutcome) -> String {
        let mut output = String::new();
        output.push_str(&format!(
            "\n{}\n{}\n\n",
            "━".repeat(50).dimmed(),
            "  SCAN RESULTS".bold()
        ));

        if !outcome.result.has_valid_result() {
            output.push_str(&format!("  {}\n", "No rule matched.".green()));
            return output;
        }

        for rule_match in &outcome.result.matched {
            output.push_str(&format!(
                "{} {} ({})\n",
                format!("[{}]", rule_match.rule_id).dimmed(),
                rule_match.rule_name.yellow().bold(),
                rule_match.count()
            ));
            if !rule_match.rule_describe.is_empty() {
                output.push_str(&format!("    {}\n", rule_match.rule_describe.dimmed()));
            }

            if outcome.result.record_committer {
                for committer in &rule_match.committers {
                    let name = if committer.committer.is_empty() {
                        "unknown".red().to_string()
                    } else {
                        committer.committer.cyan().to_string()
                    };
                    output.push_str(&format!("    {} {}\n", committer.file, name));
                }
            } else {
                for identity in &rule_match.matched_items {
                    output.push_str(&format!("    {}\n", identity));
                }
            }
            output.push('\n');
        }
        output
    }

    fn format_skipped(&self, outcome: &ScanOutcome) -> String {
        let skipped: Vec<_> = outcome
            .statuses
            .iter()
            .filter(|s| s.allowed && s.readiness != RuleReadiness::Admitted)
            .collect();
        if skipped.is_empty() {
            return String::new();
        }

        let mut output = format!("{}\n", "Skipped rules:".yellow().bold());
        for status in skipped {
            output.push_str(&format!("    {} ({})\n", status.rule_name, status.readiness));
        }
        output.push('\n');
        output
    }

    fn format_summary(&self, outcome: &ScanOutcome) -> String {
        let mut output = format!("{}\n", "━".repeat(50).dimmed());
        output.push_str(&format!(
            "  {} matches in {} rules, {}\n",
            outcome.result.total_matches().to_string().bold(),
            outcome.result.matched.len(),
            outcome.timing.total_duration_formatted()
        ));

        let mut slowest: Vec<_> = outcome.timing.rules.iter().collect();
        slowest.sort_by(|a, b| b.duration.cmp(&a.duration));
        for timing in slowest.into_iter().take(3) {
            output.push_str(&format!(
                "    {} {} ({} of {})\n",
                timing.duration_formatted().dimmed(),
                timing.rule_name,
                timing.matched,
                timing.candidates
            ));
        }
        output
    }
}

impl Default for TerminalOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportRenderer for TerminalOutput {
    fn render_report(&self, outcome: &ScanOutcome) -> Result<String, ResScanError> {
        let mut output = self.format_header(outcome);
        output.push_str(&self.format_matches(outcome));
        output.push_str(&self.format_skipped(outcome));
        output.push_str(&self.format_summary(outcome));
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::results::FileCommitter;
    use crate::rules::RuleMatch;

    fn outcome() -> ScanOutcome {
        let mut outcome = ScanOutcome::default();
        let mut rule_match = RuleMatch::new("Texture size", "Textures above 2048", 4);
        rule_match.add_unique("/Game/UI/T_Big");
        outcome.result.push(rule_match);
        outcome
    }

    #[test]
    fn test_render_lists_identities() {
        colored::control::set_override(false);
        let rendered = TerminalOutput::new().render_report(&outcome()).unwrap();
        assert!(rendered.contains("[4] Texture size (1)"));
        assert!(rendered.contains("Textures above 2048"));
        assert!(rendered.contains("/Game/UI/T_Big"));
    }

    #[test]
    fn test_render_committers_when_recorded() {
        colored::control::set_override(false);
        let mut outcome = outcome();
        outcome.result.record_committer = true;
        outcome.result.matched[0].committers.push(FileCommitter {
            file: "Content/UI/T_Big.uasset".to_string(),
            committer: String::new(),
        });
        let rendered = TerminalOutput::new().render_report(&outcome).unwrap();
        assert!(rendered.contains("Content/UI/T_Big.uasset unknown"));
    }

    #[test]
    fn test_render_empty_result() {
        colored::control::set_override(false);
        let rendered = TerminalOutput::new()
            .render_report(&ScanOutcome::default())
            .unwrap();
        assert!(rendered.contains("No rule matched."));
    }
}
