//! Configuration loader

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

use crate::error::{ConfigError, ResScanError};
use crate::rules::model::{
    MatchLogic, NameMatchMode, PredicateGroup, Priority, Rule, RuleItem,
};

use super::paths::PathMarks;
use super::{FilterSet, GitChecker, OutputConfig, ScanRulesType};

pub const CONFIG_FILENAME: &str = "resscan.toml";

/// On-disk document formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Toml,
    Json,
    Yaml,
}

impl DocumentFormat {
    /// Pick the format from a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            "yaml" | "yml" => Some(Self::Yaml),
            _ => None,
        }
    }
}

/// Parse a document from text
pub fn parse_document<T: DeserializeOwned>(
    content: &str,
    format: DocumentFormat,
    origin: &str,
) -> Result<T, ConfigError> {
    let parsed = match format {
        DocumentFormat::Toml => toml::from_str(content).map_err(|e| e.to_string()),
        DocumentFormat::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
        DocumentFormat::Yaml => serde_yaml::from_str(content).map_err(|e| e.to_string()),
    };
    parsed.map_err(|message| ConfigError::Parse {
        path: origin.to_string(),
        message,
    })
}

/// Read and parse a TOML, JSON or YAML file
pub fn read_document<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let format = DocumentFormat::from_path(path).ok_or_else(|| ConfigError::UnsupportedFormat {
        path: path.display().to_string(),
    })?;
    let content = fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
        path: path.display().to_string(),
        source: e,
    })?;
    parse_document(&content, format, &path.display().to_string())
}

/// External table of rules, merged with the inline rules at scan time
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RulesTable {
    #[serde(default)]
    pub rules: Vec<Rule>,
}

/// Main scan configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Name used for saved outputs; a UTC timestamp when empty
    #[serde(default)]
    pub config_name: String,

    /// Rule admission policy
    #[serde(default)]
    pub scan_rules_type: ScanRulesType,

    /// Rule IDs admitted under `rule_ids` (empty admits every ID)
    #[serde(default)]
    pub rule_allow_list: Vec<u32>,

    /// Rule IDs rejected under `rule_ids`; wins over the allow-list
    #[serde(default)]
    pub rule_block_list: Vec<u32>,

    /// Priorities admitted under `priorities`
    #[serde(default)]
    pub priorities: Vec<Priority>,

    /// Build the candidate set from `global_scan_filters`
    #[serde(default)]
    pub by_global_scan_filters: bool,

    #[serde(default)]
    pub global_scan_filters: FilterSet,

    #[serde(default)]
    pub global_ignore_filters: FilterSet,

    /// Per-rule scopes query the indexer directly instead of narrowing the
    /// candidate set
    #[serde(default)]
    pub block_rule_filter: bool,

    #[serde(default)]
    pub git_checker: GitChecker,

    #[serde(default)]
    pub output: OutputConfig,

    /// Log every rule configuration and matched item
    #[serde(default)]
    pub verbose_log: bool,

    /// Scan the rules of `import_rules_table` before the inline rules
    #[serde(default)]
    pub use_rules_table: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub import_rules_table: Option<String>,

    #[serde(default)]
    pub rules: Vec<Rule>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            config_name: String::new(),
            scan_rules_type: ScanRulesType::All,
            rule_allow_list: Vec::new(),
            rule_block_list: Vec::new(),
            priorities: Vec::new(),
            by_global_scan_filters: false,
            global_scan_filters: FilterSet::default(),
            global_ignore_filters: FilterSet::default(),
            block_rule_filter: false,
            git_checker: GitChecker::default(),
            output: OutputConfig::default(),
            verbose_log: false,
            use_rules_table: false,
            import_rules_table: None,
            rules: Vec::new(),
        }
    }
}

impl ScanConfig {
    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self, ResScanError> {
        let config: Self = read_document(path)?;
        debug!(
            path = %path.display(),
            rules = config.rules.len(),
            "Loaded scan configuration"
        );
        Ok(config)
    }

    /// Starter configuration written by `resscan init`
    pub fn starter() -> Self {
        let mut config = Self {
            config_name: "Default".to_string(),
            by_global_scan_filters: true,
            ..Default::default()
        };
        config.global_scan_filters.scopes.push("/Game".to_string());
        config
            .global_ignore_filters
            .scopes
            .push("/Game/Developers".to_string());

        let mut rule = Rule::new("Skeletal mesh naming")
            .with_description("Skeletal meshes must use the SK_ prefix")
            .with_priority(Priority::High)
            .with_asset_type("SkeletalMesh")
            .with_scan_filter("/Game");
        rule.name_rules.groups.push(PredicateGroup {
            match_mode: NameMatchMode::StartWith,
            match_logic: MatchLogic::Necessary,
            optional_match_num: 0,
            rules: vec![RuleItem::reversed("SK_")],
            reverse_check: false,
        });
        config.rules.push(rule);
        config
    }

    /// Serialize configuration to TOML
    pub fn to_toml(&self) -> Result<String, ResScanError> {
        toml::to_string_pretty(self).map_err(Into::into)
    }

    /// Serialize configuration to JSON
    pub fn to_json(&self) -> Result<String, ResScanError> {
        serde_json::to_string_pretty(self).map_err(Into::into)
    }

    /// Serialize configuration to YAML
    pub fn to_yaml(&self) -> Result<String, ResScanError> {
        serde_yaml::to_string(self).map_err(Into::into)
    }

    /// Serialize in the format matching `path`'s extension
    pub fn to_format_of(&self, path: &Path) -> Result<String, ResScanError> {
        match DocumentFormat::from_path(path) {
            Some(DocumentFormat::Toml) => self.to_toml(),
            Some(DocumentFormat::Json) => self.to_json(),
            Some(DocumentFormat::Yaml) => self.to_yaml(),
            None => Err(ConfigError::UnsupportedFormat {
                path: path.display().to_string(),
            }
            .into()),
        }
    }

    /// Apply the admission policy to a rule
    pub fn is_allow_rule(&self, rule: &Rule, rule_id: u32) -> bool {
        match self.scan_rules_type {
            ScanRulesType::All => true,
            ScanRulesType::RuleIds => {
                let allowed = self.rule_allow_list.is_empty()
                    || self.rule_allow_list.contains(&rule_id);
                allowed && !self.rule_block_list.contains(&rule_id)
            }
            ScanRulesType::Priorities => self.priorities.contains(&rule.priority),
        }
    }

    /// Whether global scope filtering is active
    pub fn uses_global_scope(&self) -> bool {
        self.by_global_scan_filters
    }

    /// Rules of the imported table
    ///
    /// A missing or unreadable table yields no rules and a warning.
    pub fn table_rules(&self, marks: &PathMarks) -> Vec<Rule> {
        if !self.use_rules_table {
            return Vec::new();
        }
        let Some(table) = self.import_rules_table.as_deref() else {
            warn!("use_rules_table is set but import_rules_table is empty");
            return Vec::new();
        };

        let path = marks.resolve(table);
        match read_document::<RulesTable>(&path) {
            Ok(table) => {
                debug!(path = %path.display(), rules = table.rules.len(), "Imported rules table");
                table.rules
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to import rules table");
                Vec::new()
            }
        }
    }
}
