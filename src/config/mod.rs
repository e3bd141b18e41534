//! Configuration module

pub mod loader;
pub mod paths;

pub use loader::{RulesTable, ScanConfig};
pub use paths::PathMarks;

use serde::{Deserialize, Serialize};

use crate::items::identity;
use crate::items::Item;

fn default_true() -> bool {
    true
}

/// Scopes plus explicit item references
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct FilterSet {
    /// Package path prefixes (e.g. `/Game/Characters`)
    #[serde(default)]
    pub scopes: Vec<String>,

    /// Explicit items, by package name or object path
    #[serde(default)]
    pub items: Vec<String>,
}

impl FilterSet {
    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty() && self.items.is_empty()
    }

    /// Whether an item lies in one of the scopes
    pub fn covers(&self, item: &Item) -> bool {
        self.scopes
            .iter()
            .any(|scope| identity::scope_contains(scope, item.package_path()))
    }

    /// Whether an item is referenced explicitly
    pub fn references(&self, item: &Item) -> bool {
        let object_path = item.object_path();
        self.items
            .iter()
            .any(|r| *r == object_path || *r == item.package_name)
    }
}

/// Rule admission policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanRulesType {
    /// Every rule is admitted
    #[default]
    All,
    /// Allow-list and block-list over rule IDs
    RuleIds,
    /// Only rules with an accepted priority
    Priorities,
}

/// Version control settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitChecker {
    /// Include change-set items and allow VCS queries
    #[serde(default)]
    pub enabled: bool,

    /// Repository directory (placeholders allowed)
    #[serde(default = "default_repo_dir")]
    pub repo_dir: String,

    /// Scan files changed between two revisions
    #[serde(default)]
    pub diff_commit: bool,

    #[serde(default)]
    pub begin_commit: String,

    /// Defaults to `HEAD` when empty
    #[serde(default)]
    pub end_commit: String,

    /// Scan files with uncommitted changes
    #[serde(default)]
    pub uncommitted_files: bool,

    /// Attribute every match to its last committer
    #[serde(default)]
    pub record_committer: bool,

    /// Git executable
    #[serde(default = "default_git_binary")]
    pub git_binary: String,

    /// Timeout applied to every git invocation
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Mount point of the content directory
    #[serde(default = "default_content_mount")]
    pub content_mount: String,

    /// Directory backing the mount (placeholders allowed)
    #[serde(default = "default_content_dir")]
    pub content_dir: String,
}

fn default_repo_dir() -> String {
    paths::PROJECT_CONTENT_DIR_MARK.to_string()
}

fn default_git_binary() -> String {
    "git".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_content_mount() -> String {
    identity::DEFAULT_MOUNT.to_string()
}

fn default_content_dir() -> String {
    paths::PROJECT_CONTENT_DIR_MARK.to_string()
}

impl Default for GitChecker {
    fn default() -> Self {
        Self {
            enabled: false,
            repo_dir: default_repo_dir(),
            diff_commit: false,
            begin_commit: String::new(),
            end_commit: String::new(),
            uncommitted_files: false,
            record_committer: false,
            git_binary: default_git_binary(),
            timeout_secs: default_timeout_secs(),
            content_mount: default_content_mount(),
            content_dir: default_content_dir(),
        }
    }
}

impl GitChecker {
    /// Whether commit attribution should run after the scan
    pub fn should_record_committer(&self) -> bool {
        self.enabled && self.record_committer
    }

    /// End revision, `HEAD` when unset
    pub fn end_revision(&self) -> &str {
        if self.end_commit.trim().is_empty() {
            "HEAD"
        } else {
            self.end_commit.trim()
        }
    }
}

/// Output toggles
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Write the effective configuration next to the result
    #[serde(default)]
    pub save_config: bool,

    /// Write the scan result when something matched
    #[serde(default = "default_true")]
    pub save_result: bool,

    /// Write the lite text result instead of the verbose JSON
    #[serde(default)]
    pub lite_result: bool,

    /// Output directory (placeholders allowed)
    #[serde(default = "default_save_path")]
    pub save_path: String,
}

fn default_save_path() -> String {
    format!("{}/ResScanner", paths::PROJECT_SAVED_DIR_MARK)
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            save_config: false,
            save_result: true,
            lite_result: false,
            save_path: default_save_path(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_set_matching() {
        let filters = FilterSet {
            scopes: vec!["/Game/Developers".to_string()],
            items: vec!["/Game/Props/SM_Old.SM_Old".to_string()],
        };
        assert!(filters.covers(&Item::new("/Game/Developers/bob/SM_Test", "StaticMesh")));
        assert!(filters.references(&Item::new("/Game/Props/SM_Old", "StaticMesh")));
        assert!(!filters.covers(&Item::new("/Game/Props/SM_Old", "StaticMesh")));
        assert!(!filters.is_empty());
    }

    #[test]
    fn test_git_checker_end_revision() {
        let mut checker = GitChecker::default();
        assert_eq!(checker.end_revision(), "HEAD");
        checker.end_commit = " abc123 ".to_string();
        assert_eq!(checker.end_revision(), "abc123");
        assert!(!checker.should_record_committer());
    }
}
