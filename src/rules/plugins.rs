//! # Plugins
//!
//! Custom predicates and post-processors are referenced by `kind` from rule
//! configuration and instantiated through a [`Plugins`] registry that the
//! caller hands to the scan engine.
//!
//! Built-in predicates:
//!
//! | Kind | Fast | Parameters | Matches when |
//! |------|------|------------|--------------|
//! | `name-length` | yes | `max` | the asset name is longer than `max` characters |
//! | `property-above` | no | `property`, `threshold` | the numeric property exceeds `threshold` |
//! | `committer-not-allowed` | no | `allow` | the item's last editor is not in `allow` |
//!
//! Built-in post-processors: `log` and `write-list` (`path`).

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::PathBuf;
use tracing::info;

use super::model::{CustomRuleRef, MatchLogic, PluginParams, PostProcessorRef};
use super::results::RuleMatch;
use crate::config::PathMarks;
use crate::error::{ConfigError, ReportError, ResScanError};
use crate::items::{identity, Item};

/// A custom match predicate
///
/// Fast predicates only see the identity and type tag; the others receive
/// the whole item.
pub trait CustomPredicate: Send + Sync {
    /// Plugin kind
    fn name(&self) -> &str;

    /// Whether a failure stops the custom chain
    fn match_logic(&self) -> MatchLogic;

    /// Whether [`CustomPredicate::match_fast`] is sufficient
    fn is_fast_match(&self) -> bool {
        false
    }

    fn match_fast(&self, identity: &str, item_type: &str) -> bool {
        let _ = (identity, item_type);
        false
    }

    fn match_item(&self, item: &Item, item_type: &str) -> bool;
}

/// Runs once per rule after a scan found matches
pub trait PostProcessor: Send + Sync {
    fn name(&self) -> &str;

    /// `item_type` is the rule's scanned type, empty when the rule accepts any
    fn process(&self, rule_match: &RuleMatch, item_type: &str) -> Result<(), ResScanError>;
}

pub type PredicateFactory = Box<
    dyn Fn(&CustomRuleRef, &PathMarks) -> Result<Box<dyn CustomPredicate>, ConfigError> + Send + Sync,
>;

pub type PostProcessorFactory = Box<
    dyn Fn(&PostProcessorRef, &PathMarks) -> Result<Box<dyn PostProcessor>, ConfigError>
        + Send
        + Sync,
>;

/// Registry of plugin factories keyed by kind
pub struct Plugins {
    predicates: BTreeMap<String, PredicateFactory>,
    post_processors: BTreeMap<String, PostProcessorFactory>,
}

impl fmt::Debug for Plugins {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Plugins")
            .field("predicates", &self.predicates.keys().collect::<Vec<_>>())
            .field("post_processors", &self.post_processors.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Default for Plugins {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl Plugins {
    /// A registry without any plugin
    pub fn empty() -> Self {
        Self {
            predicates: BTreeMap::new(),
            post_processors: BTreeMap::new(),
        }
    }

    /// A registry with the built-in plugins
    pub fn with_builtins() -> Self {
        let mut plugins = Self::empty();

        plugins.register_predicate("name-length", |r, _| {
            Ok(Box::new(NameLength {
                max: param_u64(&r.params, &r.kind, "max")? as usize,
                logic: r.match_logic,
            }))
        });
        plugins.register_predicate("property-above", |r, _| {
            Ok(Box::new(PropertyAbove {
                property: param_str(&r.params, &r.kind, "property")?,
                threshold: param_f64(&r.params, &r.kind, "threshold")?,
                logic: r.match_logic,
            }))
        });
        plugins.register_predicate("committer-not-allowed", |r, _| {
            Ok(Box::new(CommitterNotAllowed {
                allow: param_str_list(&r.params, &r.kind, "allow")?,
                logic: r.match_logic,
            }))
        });

        plugins.register_post_processor("log", |_, _| Ok(Box::new(LogMatches)));
        plugins.register_post_processor("write-list", |r, marks| {
            let path = param_str(&r.params, &r.kind, "path")?;
            Ok(Box::new(WriteList {
                path: marks.resolve(&path),
            }))
        });

        plugins
    }

    pub fn register_predicate<F>(&mut self, kind: impl Into<String>, factory: F)
    where
        F: Fn(&CustomRuleRef, &PathMarks) -> Result<Box<dyn CustomPredicate>, ConfigError>
            + Send
            + Sync
            + 'static,
    {
        self.predicates.insert(kind.into(), Box::new(factory));
    }

    pub fn register_post_processor<F>(&mut self, kind: impl Into<String>, factory: F)
    where
        F: Fn(&PostProcessorRef, &PathMarks) -> Result<Box<dyn PostProcessor>, ConfigError>
            + Send
            + Sync
            + 'static,
    {
        self.post_processors.insert(kind.into(), Box::new(factory));
    }

    /// Instantiate the predicate a rule references
    pub fn create_predicate(
        &self,
        reference: &CustomRuleRef,
        marks: &PathMarks,
    ) -> Result<Box<dyn CustomPredicate>, ConfigError> {
        let factory = self
            .predicates
            .get(&reference.kind)
            .ok_or_else(|| ConfigError::UnknownPlugin {
                kind: reference.kind.clone(),
            })?;
        factory(reference, marks)
    }

    /// Instantiate the post-processor a rule references
    pub fn create_post_processor(
        &self,
        reference: &PostProcessorRef,
        marks: &PathMarks,
    ) -> Result<Box<dyn PostProcessor>, ConfigError> {
        let factory = self
            .post_processors
            .get(&reference.kind)
            .ok_or_else(|| ConfigError::UnknownPlugin {
                kind: reference.kind.clone(),
            })?;
        factory(reference, marks)
    }

    pub fn predicate_kinds(&self) -> impl Iterator<Item = &str> {
        self.predicates.keys().map(String::as_str)
    }

    pub fn post_processor_kinds(&self) -> impl Iterator<Item = &str> {
        self.post_processors.keys().map(String::as_str)
    }
}

fn invalid(kind: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::InvalidPlugin {
        kind: kind.to_string(),
        message: message.into(),
    }
}

fn param<'a>(params: &'a PluginParams, kind: &str, key: &str) -> Result<&'a serde_json::Value, ConfigError> {
    params
        .get(key)
        .ok_or_else(|| invalid(kind, format!("missing parameter '{}'", key)))
}

fn param_u64(params: &PluginParams, kind: &str, key: &str) -> Result<u64, ConfigError> {
    param(params, kind, key)?
        .as_u64()
        .ok_or_else(|| invalid(kind, format!("'{}' must be a non-negative integer", key)))
}

fn param_f64(params: &PluginParams, kind: &str, key: &str) -> Result<f64, ConfigError> {
    param(params, kind, key)?
        .as_f64()
        .ok_or_else(|| invalid(kind, format!("'{}' must be a number", key)))
}

fn param_str(params: &PluginParams, kind: &str, key: &str) -> Result<String, ConfigError> {
    param(params, kind, key)?
        .as_str()
        .map(String::from)
        .ok_or_else(|| invalid(kind, format!("'{}' must be a string", key)))
}

fn param_str_list(params: &PluginParams, kind: &str, key: &str) -> Result<Vec<String>, ConfigError> {
    let values = param(params, kind, key)?
        .as_array()
        .ok_or_else(|| invalid(kind, format!("'{}' must be a list of strings", key)))?;
    values
        .iter()
        .map(|v| {
            v.as_str()
                .map(String::from)
                .ok_or_else(|| invalid(kind, format!("'{}' must be a list of strings", key)))
        })
        .collect()
}

struct NameLength {
    max: usize,
    logic: MatchLogic,
}

impl CustomPredicate for NameLength {
    fn name(&self) -> &str {
        "name-length"
    }

    fn match_logic(&self) -> MatchLogic {
        self.logic
    }

    fn is_fast_match(&self) -> bool {
        true
    }

    fn match_fast(&self, identity: &str, _item_type: &str) -> bool {
        identity::asset_name(identity).chars().count() > self.max
    }

    fn match_item(&self, item: &Item, item_type: &str) -> bool {
        self.match_fast(&item.package_name, item_type)
    }
}

struct PropertyAbove {
    property: String,
    threshold: f64,
    logic: MatchLogic,
}

impl CustomPredicate for PropertyAbove {
    fn name(&self) -> &str {
        "property-above"
    }

    fn match_logic(&self) -> MatchLogic {
        self.logic
    }

    fn match_item(&self, item: &Item, _item_type: &str) -> bool {
        item.property(&self.property)
            .and_then(|v| v.as_f64())
            .map(|v| v > self.threshold)
            .unwrap_or(false)
    }
}

struct CommitterNotAllowed {
    allow: Vec<String>,
    logic: MatchLogic,
}

impl CustomPredicate for CommitterNotAllowed {
    fn name(&self) -> &str {
        "committer-not-allowed"
    }

    fn match_logic(&self) -> MatchLogic {
        self.logic
    }

    fn match_item(&self, item: &Item, _item_type: &str) -> bool {
        match item.annotations.last_editor.as_deref() {
            Some(editor) if !editor.is_empty() => !self.allow.iter().any(|a| a == editor),
            _ => false,
        }
    }
}

struct LogMatches;

impl PostProcessor for LogMatches {
    fn name(&self) -> &str {
        "log"
    }

    fn process(&self, rule_match: &RuleMatch, item_type: &str) -> Result<(), ResScanError> {
        for identity in &rule_match.matched_items {
            info!(rule = %rule_match.rule_name, item = %identity, item_type, "Matched");
        }
        Ok(())
    }
}

struct WriteList {
    path: PathBuf,
}

impl PostProcessor for WriteList {
    fn name(&self) -> &str {
        "write-list"
    }

    fn process(&self, rule_match: &RuleMatch, _item_type: &str) -> Result<(), ResScanError> {
        let write_err = |e| ReportError::FileWrite {
            path: self.path.display().to_string(),
            source: e,
        };
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        let mut content = rule_match.matched_items.join("\n");
        content.push('\n');
        fs::write(&self.path, content).map_err(write_err)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::items::PropertyValue;
    use serde_json::json;
    use tempfile::tempdir;

    fn marks() -> PathMarks {
        PathMarks::for_project("/work/game", None)
    }

    #[test]
    fn test_name_length_is_fast() {
        let plugins = Plugins::with_builtins();
        let reference = CustomRuleRef::new("name-length").with_param("max", json!(5));
        let predicate = plugins.create_predicate(&reference, &marks()).unwrap();

        assert!(predicate.is_fast_match());
        assert!(predicate.match_fast("/Game/Props/SM_LongName", "StaticMesh"));
        assert!(!predicate.match_fast("/Game/Props/SM_A", "StaticMesh"));
    }

    #[test]
    fn test_property_above() {
        let plugins = Plugins::with_builtins();
        let reference = CustomRuleRef::new("property-above")
            .with_param("property", json!("LODCount"))
            .with_param("threshold", json!(3));
        let predicate = plugins.create_predicate(&reference, &marks()).unwrap();

        let item = Item::new("/Game/A", "StaticMesh").with_property("LODCount", PropertyValue::Float(4.0));
        assert!(predicate.match_item(&item, "StaticMesh"));
        let item = Item::new("/Game/B", "StaticMesh");
        assert!(!predicate.match_item(&item, "StaticMesh"));
    }

    #[test]
    fn test_committer_not_allowed() {
        let plugins = Plugins::with_builtins();
        let reference = CustomRuleRef::new("committer-not-allowed")
            .with_logic(MatchLogic::Optional)
            .with_param("allow", json!(["lead"]));
        let predicate = plugins.create_predicate(&reference, &marks()).unwrap();

        assert_eq!(predicate.match_logic(), MatchLogic::Optional);
        assert!(predicate.match_item(&Item::new("/Game/A", "T").with_last_editor("intern"), "T"));
        assert!(!predicate.match_item(&Item::new("/Game/A", "T").with_last_editor("lead"), "T"));
        assert!(!predicate.match_item(&Item::new("/Game/A", "T"), "T"));
    }

    #[test]
    fn test_unknown_and_invalid_plugins() {
        let plugins = Plugins::with_builtins();
        let result = plugins.create_predicate(&CustomRuleRef::new("nope"), &marks());
        assert!(matches!(result, Err(ConfigError::UnknownPlugin { .. })));

        let result = plugins.create_predicate(
            &CustomRuleRef::new("name-length").with_param("max", json!("ten")),
            &marks(),
        );
        assert!(matches!(result, Err(ConfigError::InvalidPlugin { .. })));
    }

    #[test]
    fn test_write_list_post_processor() {
        let dir = tempdir().unwrap();
        let marks = PathMarks::for_project(dir.path(), None);
        let plugins = Plugins::with_builtins();
        let reference = PostProcessorRef::new("write-list")
            .with_param("path", json!("[PROJECT_SAVED_DIR]/lists/naming.txt"));
        let post = plugins.create_post_processor(&reference, &marks).unwrap();

        let mut rule_match = RuleMatch::new("Naming", "", 0);
        rule_match.add_unique("/Game/A");
        rule_match.add_unique("/Game/B");
        post.process(&rule_match, "").unwrap();

        let written = fs::read_to_string(dir.path().join("Saved/lists/naming.txt")).unwrap();
        assert_eq!(written, "/Game/A\n/Game/B\n");
    }
}
