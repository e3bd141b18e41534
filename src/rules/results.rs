//! # Scan Results
//!
//! - [`RuleMatch`] - Items one rule matched, plus their committers
//! - [`MatchedResult`] - Ordered rule matches of one scan
//!
//! A `MatchedResult` serializes either as pretty JSON (verbose) or as the
//! lite text report:
//!
//! ```text
//! -------------------------------------------
//! Skeletal mesh naming (2) (Skeletal meshes must use the SK_ prefix)
//! 	/Game/Characters/Hero
//! 	/Game/Characters/Villain
//! -------------------------------------------
//! ```

use serde::{Deserialize, Serialize};

use crate::error::ResScanError;

/// Separator line of the lite report
pub const LITE_SEPARATOR: &str = "-------------------------------------------";

/// Last person who touched a matched file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileCommitter {
    /// Repository-relative file
    pub file: String,
    /// Committer name; empty when it could not be determined
    pub committer: String,
}

/// Items matched by one rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleMatch {
    pub rule_name: String,
    pub rule_describe: String,
    pub rule_id: u32,

    /// Matched identities in candidate order, without duplicates
    pub matched_items: Vec<String>,

    /// Filled by commit attribution
    #[serde(default)]
    pub committers: Vec<FileCommitter>,
}

impl RuleMatch {
    pub fn new(rule_name: impl Into<String>, rule_describe: impl Into<String>, rule_id: u32) -> Self {
        Self {
            rule_name: rule_name.into(),
            rule_describe: rule_describe.into(),
            rule_id,
            matched_items: Vec::new(),
            committers: Vec::new(),
        }
    }

    /// Append an identity unless it is already recorded
    pub fn add_unique(&mut self, identity: impl Into<String>) -> bool {
        let identity = identity.into();
        if self.matched_items.contains(&identity) {
            return false;
        }
        self.matched_items.push(identity);
        true
    }

    pub fn count(&self) -> usize {
        self.matched_items.len()
    }

    /// Header line of the lite report
    pub fn lite_header(&self) -> String {
        if self.rule_describe.is_empty() {
            format!("{} ({})", self.rule_name, self.count())
        } else {
            format!("{} ({}) ({})", self.rule_name, self.count(), self.rule_describe)
        }
    }
}

/// Result of one scan
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchedResult {
    /// One record per rule with at least one match, in scan order
    pub matched: Vec<RuleMatch>,

    /// Whether committers were recorded
    #[serde(default)]
    pub record_committer: bool,
}

impl MatchedResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rule match; empty matches are dropped
    pub fn push(&mut self, rule_match: RuleMatch) {
        if rule_match.count() > 0 {
            self.matched.push(rule_match);
        }
    }

    pub fn has_valid_result(&self) -> bool {
        !self.matched.is_empty()
    }

    /// Number of matched identities over all rules
    pub fn total_matches(&self) -> usize {
        self.matched.iter().map(RuleMatch::count).sum()
    }

    /// Pretty JSON form with stable field names
    pub fn serialize_verbose(&self) -> Result<String, ResScanError> {
        serde_json::to_string_pretty(self).map_err(Into::into)
    }

    /// Human-readable form
    pub fn serialize_lite(&self) -> String {
        let mut out = String::new();
        for rule_match in &self.matched {
            out.push_str(LITE_SEPARATOR);
            out.push('\n');
            out.push_str(&rule_match.lite_header());
            out.push('\n');

            if self.record_committer {
                for committer in &rule_match.committers {
                    out.push_str(&format!("\t{}, {}\n", committer.file, committer.committer));
                }
            } else {
                for identity in &rule_match.matched_items {
                    out.push_str(&format!("\t{}\n", identity));
                }
            }
        }
        out.push_str(LITE_SEPARATOR);
        out.push('\n');
        out
    }

    /// Lite or verbose form
    pub fn serialize(&self, lite: bool) -> Result<String, ResScanError> {
        if lite {
            Ok(self.serialize_lite())
        } else {
            self.serialize_verbose()
        }
    }
}
