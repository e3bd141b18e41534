//! Saved scan outputs
//!
//! Writes `<name>_config.json` and `<name>_result.json` under the configured
//! save path. The result file of a previous run with the same name is
//! removed first so a clean scan never leaves stale matches behind.

use chrono::Utc;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use super::results::MatchedResult;
use crate::config::{PathMarks, ScanConfig};
use crate::error::{ReportError, ResScanError};

/// Files written by [`save_outputs`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SavedOutputs {
    pub config_file: Option<PathBuf>,
    pub result_file: Option<PathBuf>,
}

/// Output name: the config name, or a UTC timestamp when it is empty
pub fn output_name(config: &ScanConfig) -> String {
    let name = config.config_name.trim();
    if name.is_empty() {
        Utc::now().format("%Y.%m.%d-%H.%M.%S").to_string()
    } else {
        name.to_string()
    }
}

fn write_file(path: &Path, content: &str) -> Result<(), ReportError> {
    let write_err = |e| ReportError::FileWrite {
        path: path.display().to_string(),
        source: e,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(write_err)?;
    }
    fs::write(path, content).map_err(write_err)
}

/// Persist the configuration and result according to `config.output`
pub fn save_outputs(
    config: &ScanConfig,
    marks: &PathMarks,
    result: &MatchedResult,
) -> Result<SavedOutputs, ResScanError> {
    let output = &config.output;
    let base = marks.resolve(&output.save_path);
    let name = output_name(config);
    let mut saved = SavedOutputs::default();

    if output.save_config {
        let path = base.join(format!("{}_config.json", name));
        write_file(&path, &config.to_json()?)?;
        info!(path = %path.display(), "Saved scan configuration");
        saved.config_file = Some(path);
    }

    let result_path = base.join(format!("{}_result.json", name));
    if result_path.exists() {
        fs::remove_file(&result_path).map_err(|e| ReportError::FileWrite {
            path: result_path.display().to_string(),
            source: e,
        })?;
    }

    if output.save_result && result.has_valid_result() {
        write_file(&result_path, &result.serialize(output.lite_result)?)?;
        info!(path = %result_path.display(), "Saved scan result");
        saved.result_file = Some(result_path);
    }

    Ok(saved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::results::RuleMatch;
    use tempfile::tempdir;

    fn result() -> MatchedResult {
        let mut rule_match = RuleMatch::new("Naming", "", 0);
        rule_match.add_unique("/Game/SK_Hero");
        let mut result = MatchedResult::new();
        result.push(rule_match);
        result
    }

    #[test]
    fn test_save_outputs_writes_both_files() {
        let dir = tempdir().unwrap();
        let marks = PathMarks::for_project(dir.path(), None);
        let mut config = ScanConfig::default();
        config.config_name = "nightly".to_string();
        config.output.save_config = true;
        config.output.lite_result = true;

        let saved = save_outputs(&config, &marks, &result()).unwrap();
        let result_file = saved.result_file.unwrap();
        assert_eq!(result_file, dir.path().join("Saved/ResScanner/nightly_result.json"));
        assert!(fs::read_to_string(result_file).unwrap().contains("Naming (1)"));
        assert!(saved.config_file.unwrap().exists());
    }

    #[test]
    fn test_stale_result_is_removed() {
        let dir = tempdir().unwrap();
        let marks = PathMarks::for_project(dir.path(), None);
        let mut config = ScanConfig::default();
        config.config_name = "nightly".to_string();

        save_outputs(&config, &marks, &result()).unwrap();
        let saved = save_outputs(&config, &marks, &MatchedResult::new()).unwrap();
        assert!(saved.result_file.is_none());
        assert!(!dir.path().join("Saved/ResScanner/nightly_result.json").exists());
    }

    #[test]
    fn test_output_name_defaults_to_timestamp() {
        let name = output_name(&ScanConfig::default());
        assert_eq!(name.len(), "2024.01.01-00.00.00".len());
    }
}
