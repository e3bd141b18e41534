//! # Rule Model
//!
//! Pure data describing what a rule looks for. Every predicate family
//! (name, path, property) is a list of groups combined with the same
//! Necessary/Optional logic; custom predicates and post-processors are named
//! plugin references resolved through [`crate::rules::plugins::Plugins`].
//!
//! ## Example
//!
//! ```toml
//! [[rules]]
//! rule_name = "Skeletal meshes need the SK_ prefix"
//! scan_asset_type = "SkeletalMesh"
//! scan_filters = ["/Game/Characters"]
//!
//! [[rules.name_rules.groups]]
//! match_mode = "start_with"
//! rules = [{ rule_text = "SK_", reverse_check = true }]
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::FilterSet;

fn default_true() -> bool {
    true
}

/// How the RuleItems of a group are combined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchLogic {
    /// Every RuleItem must match
    #[default]
    Necessary,
    /// Exactly `optional_match_num` RuleItems must match
    Optional,
}

/// Name match modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NameMatchMode {
    /// Asset name starts with the text, ignoring ASCII case
    #[default]
    StartWith,
    /// Asset name ends with the text, ignoring ASCII case
    EndWith,
    /// Case-insensitive wildcard (`*`, `?`)
    Wildcard,
}

/// Path match modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathMatchMode {
    /// Object path starts with the text, ignoring ASCII case
    #[default]
    WithIn,
    /// Case-insensitive wildcard (`*`, `?`)
    Wildcard,
}

/// Property comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyMatchRule {
    /// Value equals the expected text
    #[default]
    Equal,
    /// Value differs from the expected text
    NotEqual,
}

/// Priority of a rule, used by the priority admission policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
    Critical,
}

/// One atomic textual pattern
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RuleItem {
    /// Pattern text
    pub rule_text: String,

    /// Negate the result of this pattern
    #[serde(default)]
    pub reverse_check: bool,
}

impl RuleItem {
    pub fn new(rule_text: impl Into<String>) -> Self {
        Self {
            rule_text: rule_text.into(),
            reverse_check: false,
        }
    }

    pub fn reversed(rule_text: impl Into<String>) -> Self {
        Self {
            rule_text: rule_text.into(),
            reverse_check: true,
        }
    }
}

/// Group-level combination settings shared by every family
pub trait GroupLogic {
    fn match_logic(&self) -> MatchLogic;
    fn optional_match_num(&self) -> usize;
    fn reverse_check(&self) -> bool;
}

/// A group of textual patterns evaluated with one match mode
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PredicateGroup<M> {
    /// How each pattern is compared
    #[serde(default)]
    pub match_mode: M,

    /// Combination logic
    #[serde(default)]
    pub match_logic: MatchLogic,

    /// Exact number of matches required under Optional logic
    #[serde(default)]
    pub optional_match_num: usize,

    /// Patterns of this group
    #[serde(default)]
    pub rules: Vec<RuleItem>,

    /// Negate the group result
    #[serde(default)]
    pub reverse_check: bool,
}

impl<M> PredicateGroup<M> {
    /// A Necessary group
    pub fn necessary(match_mode: M, rules: Vec<RuleItem>) -> Self {
        Self {
            match_mode,
            match_logic: MatchLogic::Necessary,
            optional_match_num: 0,
            rules,
            reverse_check: false,
        }
    }

    /// An Optional group requiring exactly `count` matches
    pub fn optional(match_mode: M, count: usize, rules: Vec<RuleItem>) -> Self {
        Self {
            match_mode,
            match_logic: MatchLogic::Optional,
            optional_match_num: count,
            rules,
            reverse_check: false,
        }
    }
}

impl<M> GroupLogic for PredicateGroup<M> {
    fn match_logic(&self) -> MatchLogic {
        self.match_logic
    }

    fn optional_match_num(&self) -> usize {
        self.optional_match_num
    }

    fn reverse_check(&self) -> bool {
        self.reverse_check
    }
}

/// One property comparison
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PropertyRuleItem {
    /// Property to read
    pub property_name: String,

    /// Expected value, as text
    pub match_value: String,

    /// Equal or not equal
    #[serde(default)]
    pub match_rule: PropertyMatchRule,
}

impl PropertyRuleItem {
    pub fn new(
        property_name: impl Into<String>,
        match_value: impl Into<String>,
        match_rule: PropertyMatchRule,
    ) -> Self {
        Self {
            property_name: property_name.into(),
            match_value: match_value.into(),
            match_rule,
        }
    }
}

/// A group of property comparisons
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PropertyGroup {
    #[serde(default)]
    pub match_logic: MatchLogic,

    #[serde(default)]
    pub optional_match_num: usize,

    #[serde(default)]
    pub rules: Vec<PropertyRuleItem>,

    #[serde(default)]
    pub reverse_check: bool,
}

impl GroupLogic for PropertyGroup {
    fn match_logic(&self) -> MatchLogic {
        self.match_logic
    }

    fn optional_match_num(&self) -> usize {
        self.optional_match_num
    }

    fn reverse_check(&self) -> bool {
        self.reverse_check
    }
}

/// All groups of one predicate family
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredicateFamily<G> {
    /// Groups, ANDed in declaration order
    #[serde(default = "Vec::new")]
    pub groups: Vec<G>,

    /// Negate the family result when at least one group is declared
    #[serde(default)]
    pub reverse_check: bool,
}

impl<G> Default for PredicateFamily<G> {
    fn default() -> Self {
        Self {
            groups: Vec::new(),
            reverse_check: false,
        }
    }
}

impl<G> PredicateFamily<G> {
    pub fn new(groups: Vec<G>) -> Self {
        Self {
            groups,
            reverse_check: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

pub type NameRules = PredicateFamily<PredicateGroup<NameMatchMode>>;
pub type PathRules = PredicateFamily<PredicateGroup<PathMatchMode>>;
pub type PropertyRules = PredicateFamily<PropertyGroup>;

/// Free-form plugin parameters
pub type PluginParams = BTreeMap<String, serde_json::Value>;

/// Reference to a custom predicate plugin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomRuleRef {
    /// Registered plugin name
    pub kind: String,

    /// Whether a failure stops the custom chain
    #[serde(default)]
    pub match_logic: MatchLogic,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub params: PluginParams,
}

impl CustomRuleRef {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            match_logic: MatchLogic::Necessary,
            params: PluginParams::new(),
        }
    }

    pub fn with_logic(mut self, logic: MatchLogic) -> Self {
        self.match_logic = logic;
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.params.insert(key.into(), value);
        self
    }
}

/// Reference to a post-processor plugin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostProcessorRef {
    /// Registered plugin name
    pub kind: String,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub params: PluginParams,
}

impl PostProcessorRef {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            params: PluginParams::new(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.params.insert(key.into(), value);
        self
    }
}

/// A named, prioritized bundle of predicates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    /// Display name
    pub rule_name: String,

    /// Explicit rule ID; defaults to the rule's index in its list
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u32>,

    /// Human description
    #[serde(default)]
    pub rule_describe: String,

    #[serde(default)]
    pub priority: Priority,

    #[serde(default = "default_true")]
    pub enable_rule: bool,

    /// Item type the rule applies to; `None` accepts every type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scan_asset_type: Option<String>,

    /// Accept subtypes of `scan_asset_type`
    #[serde(default = "default_true")]
    pub recursive_types: bool,

    /// Scopes the rule scans
    #[serde(default)]
    pub scan_filters: Vec<String>,

    /// Global candidates must lie inside `scan_filters`
    #[serde(default = "default_true")]
    pub global_must_match_filter: bool,

    #[serde(default)]
    pub ignore_filters: FilterSet,

    #[serde(default)]
    pub name_rules: NameRules,

    #[serde(default)]
    pub path_rules: PathRules,

    #[serde(default)]
    pub property_rules: PropertyRules,

    #[serde(default)]
    pub custom_rules: Vec<CustomRuleRef>,

    #[serde(default)]
    pub enable_post_processor: bool,

    #[serde(default)]
    pub post_processors: Vec<PostProcessorRef>,
}

impl Rule {
    /// An enabled rule with no filters and no predicates
    pub fn new(rule_name: impl Into<String>) -> Self {
        Self {
            rule_name: rule_name.into(),
            id: None,
            rule_describe: String::new(),
            priority: Priority::Normal,
            enable_rule: true,
            scan_asset_type: None,
            recursive_types: true,
            scan_filters: Vec::new(),
            global_must_match_filter: true,
            ignore_filters: FilterSet::default(),
            name_rules: NameRules::default(),
            path_rules: PathRules::default(),
            property_rules: PropertyRules::default(),
            custom_rules: Vec::new(),
            enable_post_processor: false,
            post_processors: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.rule_describe = description.into();
        self
    }

    pub fn with_id(mut self, id: u32) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_asset_type(mut self, asset_type: impl Into<String>) -> Self {
        self.scan_asset_type = Some(asset_type.into());
        self
    }

    pub fn with_scan_filter(mut self, scope: impl Into<String>) -> Self {
        self.scan_filters.push(scope.into());
        self
    }

    pub fn with_name_group(mut self, group: PredicateGroup<NameMatchMode>) -> Self {
        self.name_rules.groups.push(group);
        self
    }

    pub fn with_path_group(mut self, group: PredicateGroup<PathMatchMode>) -> Self {
        self.path_rules.groups.push(group);
        self
    }

    pub fn with_property_group(mut self, group: PropertyGroup) -> Self {
        self.property_rules.groups.push(group);
        self
    }

    pub fn with_custom_rule(mut self, custom: CustomRuleRef) -> Self {
        self.custom_rules.push(custom);
        self
    }

    pub fn with_post_processor(mut self, post: PostProcessorRef) -> Self {
        self.enable_post_processor = true;
        self.post_processors.push(post);
        self
    }

    /// Effective rule ID for a rule at `index` in its list
    pub fn effective_id(&self, index: usize) -> u32 {
        self.id.unwrap_or(index as u32)
    }

    /// Whether a name, path or property family declares a group
    pub fn has_predicate_groups(&self) -> bool {
        !self.name_rules.is_empty() || !self.path_rules.is_empty() || !self.property_rules.is_empty()
    }

    /// Type list for indexer queries
    pub fn asset_types(&self) -> Vec<String> {
        self.scan_asset_type.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_defaults_from_toml() {
        let rule: Rule = toml::from_str(
            r#"
rule_name = "Textures"

[[name_rules.groups]]
match_mode = "wildcard"
match_logic = "optional"
optional_match_num = 1
rules = [{ rule_text = "T_*" }, { rule_text = "*_D", reverse_check = true }]
"#,
        )
        .unwrap();

        assert!(rule.enable_rule);
        assert!(rule.recursive_types);
        assert_eq!(rule.priority, Priority::Normal);
        let group = &rule.name_rules.groups[0];
        assert_eq!(group.match_mode, NameMatchMode::Wildcard);
        assert_eq!(group.match_logic, MatchLogic::Optional);
        assert!(group.rules[1].reverse_check);
        assert!(rule.has_predicate_groups());
    }

    #[test]
    fn test_effective_id() {
        assert_eq!(Rule::new("a").effective_id(4), 4);
        assert_eq!(Rule::new("a").with_id(17).effective_id(4), 17);
    }

    #[test]
    fn test_custom_rules_are_not_predicate_groups() {
        let rule = Rule::new("custom only")
            .with_scan_filter("/Game")
            .with_custom_rule(CustomRuleRef::new("name-length"));
        assert!(!rule.has_predicate_groups());
    }
}
