//! # Match Operators
//!
//! Four independent predicates decide whether an item satisfies a rule:
//! name, path, property and custom. The scan engine ANDs them through an
//! [`OperatorChain`].
//!
//! Name, path and property families share one combination algorithm:
//!
//! 1. each RuleItem result is XORed with its `reverse_check` and counted,
//! 2. a Necessary group needs every RuleItem, an Optional group needs
//!    exactly `optional_match_num` of them,
//! 3. the group's own `reverse_check` inverts the group result,
//! 4. groups are ANDed in order and the first failure short-circuits,
//! 5. a family that declared at least one group applies its
//!    `reverse_check` last.

use globset::{GlobBuilder, GlobMatcher};
use tracing::warn;

use super::model::{
    GroupLogic, MatchLogic, NameMatchMode, PathMatchMode, PredicateFamily, PropertyMatchRule,
    PropertyRuleItem, Rule,
};
use super::plugins::{CustomPredicate, Plugins, PostProcessor};
use crate::config::PathMarks;
use crate::items::{Item, PropertyValue};

/// Combine per-RuleItem results of one group
pub fn evaluate_group<G: GroupLogic>(group: &G, results: impl IntoIterator<Item = bool>) -> bool {
    let mut total = 0usize;
    let mut count = 0usize;
    for matched in results {
        total += 1;
        if matched {
            count += 1;
        }
    }

    let result = match group.match_logic() {
        MatchLogic::Necessary => count == total,
        MatchLogic::Optional => count == group.optional_match_num(),
    };
    result != group.reverse_check()
}

/// Combine the groups of one family
pub fn evaluate_family<G>(family: &PredicateFamily<G>, mut group_matches: impl FnMut(usize, &G) -> bool) -> bool {
    if family.groups.is_empty() {
        return true;
    }
    let all = family
        .groups
        .iter()
        .enumerate()
        .all(|(index, group)| group_matches(index, group));
    all != family.reverse_check
}

/// Case-insensitive wildcard where only `*` and `?` are special
pub fn compile_wildcard(pattern: &str) -> Option<GlobMatcher> {
    let mut escaped = String::with_capacity(pattern.len() + 8);
    let mut previous_star = false;
    for c in pattern.chars() {
        match c {
            // `**` has directory semantics in globset
            '*' if previous_star => continue,
            '[' => escaped.push_str("[[]"),
            ']' => escaped.push_str("[]]"),
            '{' => escaped.push_str("[{]"),
            '}' => escaped.push_str("[}]"),
            _ => escaped.push(c),
        }
        previous_star = c == '*';
    }

    match GlobBuilder::new(&escaped)
        .case_insensitive(true)
        .literal_separator(false)
        .backslash_escape(false)
        .build()
    {
        Ok(glob) => Some(glob.compile_matcher()),
        Err(e) => {
            warn!(pattern, error = %e, "Invalid wildcard, it will never match");
            None
        }
    }
}

fn wildcard_matches(matcher: &Option<GlobMatcher>, text: &str) -> bool {
    matcher.as_ref().map(|m| m.is_match(text)).unwrap_or(false)
}

/// A rule with compiled wildcards and instantiated plugins
pub struct PreparedRule {
    pub rule: Rule,
    pub rule_id: u32,
    name_wildcards: Vec<Vec<Option<GlobMatcher>>>,
    path_wildcards: Vec<Vec<Option<GlobMatcher>>>,
    custom: Vec<Box<dyn CustomPredicate>>,
    post_processors: Vec<Box<dyn PostProcessor>>,
}

impl std::fmt::Debug for PreparedRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreparedRule")
            .field("rule_name", &self.rule.rule_name)
            .field("rule_id", &self.rule_id)
            .field("custom", &self.custom.len())
            .field("post_processors", &self.post_processors.len())
            .finish()
    }
}

impl PreparedRule {
    /// Compile wildcards and instantiate plugins
    ///
    /// Plugins that cannot be created are skipped with a warning.
    pub fn prepare(rule: Rule, rule_id: u32, plugins: &Plugins, marks: &PathMarks) -> Self {
        let name_wildcards: Vec<Vec<Option<GlobMatcher>>> = rule
            .name_rules
            .groups
            .iter()
            .map(|group| match group.match_mode {
                NameMatchMode::Wildcard => group
                    .rules
                    .iter()
                    .map(|r| compile_wildcard(&r.rule_text))
                    .collect(),
                _ => Vec::new(),
            })
            .collect();
        let path_wildcards: Vec<Vec<Option<GlobMatcher>>> = rule
            .path_rules
            .groups
            .iter()
            .map(|group| match group.match_mode {
                PathMatchMode::Wildcard => group
                    .rules
                    .iter()
                    .map(|r| compile_wildcard(&r.rule_text))
                    .collect(),
                PathMatchMode::WithIn => Vec::new(),
            })
            .collect();

        let custom: Vec<Box<dyn CustomPredicate>> = rule
            .custom_rules
            .iter()
            .filter_map(|reference| match plugins.create_predicate(reference, marks) {
                Ok(predicate) => Some(predicate),
                Err(e) => {
                    warn!(rule = %rule.rule_name, error = %e, "Skipping custom rule");
                    None
                }
            })
            .collect();

        let post_processors: Vec<Box<dyn PostProcessor>> = if rule.enable_post_processor {
            rule.post_processors
                .iter()
                .filter_map(|reference| match plugins.create_post_processor(reference, marks) {
                    Ok(post) => Some(post),
                    Err(e) => {
                        warn!(rule = %rule.rule_name, error = %e, "Skipping post-processor");
                        None
                    }
                })
                .collect()
        } else {
            Vec::new()
        };

        Self {
            rule,
            rule_id,
            name_wildcards,
            path_wildcards,
            custom,
            post_processors,
        }
    }

    pub fn custom_predicates(&self) -> &[Box<dyn CustomPredicate>] {
        &self.custom
    }

    pub fn post_processors(&self) -> &[Box<dyn PostProcessor>] {
        &self.post_processors
    }
}

/// ASCII case-insensitive prefix test
pub fn starts_with_ignore_case(text: &str, prefix: &str) -> bool {
    text.get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

/// ASCII case-insensitive suffix test
pub fn ends_with_ignore_case(text: &str, suffix: &str) -> bool {
    text.len()
        .checked_sub(suffix.len())
        .and_then(|start| text.get(start..))
        .is_some_and(|tail| tail.eq_ignore_ascii_case(suffix))
}

/// One predicate family evaluator
pub trait MatchOperator: Send + Sync {
    fn name(&self) -> &'static str;

    fn matches(&self, item: &Item, rule: &PreparedRule) -> bool;
}

/// Prefix, suffix and wildcard checks on the asset name
#[derive(Debug, Clone, Copy, Default)]
pub struct NameOperator;

impl MatchOperator for NameOperator {
    fn name(&self) -> &'static str {
        "name"
    }

    fn matches(&self, item: &Item, rule: &PreparedRule) -> bool {
        let name = item.asset_name();
        evaluate_family(&rule.rule.name_rules, |index, group| {
            let wildcards = &rule.name_wildcards[index];
            evaluate_group(
                group,
                group.rules.iter().enumerate().map(|(i, rule_item)| {
                    let matched = match group.match_mode {
                        NameMatchMode::StartWith => starts_with_ignore_case(name, &rule_item.rule_text),
                        NameMatchMode::EndWith => ends_with_ignore_case(name, &rule_item.rule_text),
                        NameMatchMode::Wildcard => wildcard_matches(&wildcards[i], name),
                    };
                    matched != rule_item.reverse_check
                }),
            )
        })
    }
}

/// Prefix and wildcard checks on the object path
#[derive(Debug, Clone, Copy, Default)]
pub struct PathOperator;

impl MatchOperator for PathOperator {
    fn name(&self) -> &'static str {
        "path"
    }

    fn matches(&self, item: &Item, rule: &PreparedRule) -> bool {
        let object_path = item.object_path();
        evaluate_family(&rule.rule.path_rules, |index, group| {
            let wildcards = &rule.path_wildcards[index];
            evaluate_group(
                group,
                group.rules.iter().enumerate().map(|(i, rule_item)| {
                    let matched = match group.match_mode {
                        PathMatchMode::WithIn => {
                            starts_with_ignore_case(&object_path, &rule_item.rule_text)
                        }
                        PathMatchMode::Wildcard => wildcard_matches(&wildcards[i], &object_path),
                    };
                    matched != rule_item.reverse_check
                }),
            )
        })
    }
}

/// Capability to read a named property of an item
pub trait PropertySource: Send + Sync {
    fn property(&self, item: &Item, name: &str) -> Option<PropertyValue>;
}

/// Reads the properties carried by the item record
#[derive(Debug, Clone, Copy, Default)]
pub struct ItemProperties;

impl PropertySource for ItemProperties {
    fn property(&self, item: &Item, name: &str) -> Option<PropertyValue> {
        item.property(name).cloned()
    }
}

/// Equality checks on property values
pub struct PropertyOperator {
    source: Box<dyn PropertySource>,
}

impl Default for PropertyOperator {
    fn default() -> Self {
        Self::new(Box::new(ItemProperties))
    }
}

impl PropertyOperator {
    pub fn new(source: Box<dyn PropertySource>) -> Self {
        Self { source }
    }

    fn compare(&self, item: &Item, rule_item: &PropertyRuleItem) -> bool {
        let Some(value) = self.source.property(item, &rule_item.property_name) else {
            return false;
        };
        let text = value.to_string();
        if text.is_empty() {
            return false;
        }

        let equal = if value.is_float() {
            let expected = rule_item.match_value.trim().parse::<f64>().unwrap_or(0.0);
            value.as_f64().unwrap_or(0.0) == expected
        } else {
            text == rule_item.match_value
        };
        match rule_item.match_rule {
            PropertyMatchRule::Equal => equal,
            PropertyMatchRule::NotEqual => !equal,
        }
    }
}

impl MatchOperator for PropertyOperator {
    fn name(&self) -> &'static str {
        "property"
    }

    fn matches(&self, item: &Item, rule: &PreparedRule) -> bool {
        evaluate_family(&rule.rule.property_rules, |_, group| {
            evaluate_group(
                group,
                group.rules.iter().map(|rule_item| self.compare(item, rule_item)),
            )
        })
    }
}

/// Ordered chain of plugin predicates
///
/// The chain result is the last evaluated result. A failing Necessary
/// predicate stops the chain; a failing Optional one does not.
#[derive(Debug, Clone, Copy, Default)]
pub struct CustomOperator;

impl MatchOperator for CustomOperator {
    fn name(&self) -> &'static str {
        "custom"
    }

    fn matches(&self, item: &Item, rule: &PreparedRule) -> bool {
        let mut matched = true;
        for predicate in rule.custom_predicates() {
            matched = if predicate.is_fast_match() {
                predicate.match_fast(&item.package_name, &item.item_type)
            } else {
                predicate.match_item(item, &item.item_type)
            };
            if !matched && predicate.match_logic() == MatchLogic::Necessary {
                break;
            }
        }
        matched
    }
}

/// All operators, ANDed in order
pub struct OperatorChain {
    operators: Vec<Box<dyn MatchOperator>>,
}

impl Default for OperatorChain {
    fn default() -> Self {
        Self::with_property_source(Box::new(ItemProperties))
    }
}

impl OperatorChain {
    /// Standard chain reading properties through `source`
    pub fn with_property_source(source: Box<dyn PropertySource>) -> Self {
        Self {
            operators: vec![
                Box::new(NameOperator),
                Box::new(PathOperator),
                Box::new(PropertyOperator::new(source)),
                Box::new(CustomOperator),
            ],
        }
    }

    pub fn matches(&self, item: &Item, rule: &PreparedRule) -> bool {
        self.operators.iter().all(|op| op.matches(item, rule))
    }

    pub fn operator_names(&self) -> Vec<&'static str> {
        self.operators.iter().map(|op| op.name()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::model::{CustomRuleRef, PredicateGroup, PropertyGroup, RuleItem};
    use serde_json::json;

    fn prepare(rule: Rule) -> PreparedRule {
        PreparedRule::prepare(rule, 0, &Plugins::with_builtins(), &PathMarks::for_project("/p", None))
    }

    fn hero() -> Item {
        Item::new("/Game/Characters/SK_Hero", "SkeletalMesh")
    }

    #[test]
    fn test_necessary_group_needs_every_item() {
        let rule = prepare(Rule::new("n").with_name_group(PredicateGroup::necessary(
            NameMatchMode::StartWith,
            vec![RuleItem::new("SK_"), RuleItem::new("S"), RuleItem::new("T_")],
        )));
        assert!(!NameOperator.matches(&hero(), &rule));
    }

    #[test]
    fn test_optional_group_needs_exact_count() {
        let rule = prepare(Rule::new("o").with_name_group(PredicateGroup::optional(
            NameMatchMode::StartWith,
            2,
            vec![RuleItem::new("SK_"), RuleItem::new("S"), RuleItem::new("SK")],
        )));
        assert!(!NameOperator.matches(&hero(), &rule));

        let rule = prepare(Rule::new("o").with_name_group(PredicateGroup::optional(
            NameMatchMode::StartWith,
            2,
            vec![RuleItem::new("SK_"), RuleItem::new("S"), RuleItem::new("T_")],
        )));
        assert!(NameOperator.matches(&hero(), &rule));
    }

    #[test]
    fn test_item_and_family_reversal() {
        let mut rule = Rule::new("r").with_name_group(PredicateGroup::necessary(
            NameMatchMode::StartWith,
            vec![RuleItem::reversed("SK_")],
        ));
        assert!(!NameOperator.matches(&hero(), &prepare(rule.clone())));

        rule.name_rules.reverse_check = true;
        assert!(NameOperator.matches(&hero(), &prepare(rule)));
    }

    #[test]
    fn test_group_reversal() {
        let mut group = PredicateGroup::necessary(NameMatchMode::EndWith, vec![RuleItem::new("_D")]);
        group.reverse_check = true;
        let rule = prepare(Rule::new("g").with_name_group(group));
        assert!(NameOperator.matches(&hero(), &rule));
    }

    #[test]
    fn test_empty_family_passes_without_reversal() {
        let mut rule = Rule::new("e");
        rule.name_rules.reverse_check = true;
        assert!(NameOperator.matches(&hero(), &prepare(rule)));
    }

    #[test]
    fn test_name_wildcard_is_case_insensitive() {
        let rule = prepare(Rule::new("w").with_name_group(PredicateGroup::necessary(
            NameMatchMode::Wildcard,
            vec![RuleItem::new("sk_h?r*")],
        )));
        assert!(NameOperator.matches(&hero(), &rule));
    }

    #[test]
    fn test_wildcard_treats_brackets_literally() {
        let matcher = compile_wildcard("T_[0]*");
        assert!(wildcard_matches(&matcher, "T_[0]_Rock"));
        assert!(!wildcard_matches(&matcher, "T_0_Rock"));
        let matcher = compile_wildcard("**Hero**");
        assert!(wildcard_matches(&matcher, "/Game/Characters/SK_Hero.SK_Hero"));
    }

    #[test]
    fn test_path_operator() {
        let rule = prepare(Rule::new("p").with_path_group(PredicateGroup::necessary(
            PathMatchMode::WithIn,
            vec![RuleItem::new("/Game/Characters/")],
        )));
        assert!(PathOperator.matches(&hero(), &rule));

        let rule = prepare(Rule::new("p").with_path_group(PredicateGroup::necessary(
            PathMatchMode::Wildcard,
            vec![RuleItem::new("*/characters/*.sk_hero")],
        )));
        assert!(PathOperator.matches(&hero(), &rule));
    }

    fn property_rule(items: Vec<PropertyRuleItem>) -> PreparedRule {
        prepare(Rule::new("prop").with_property_group(PropertyGroup {
            rules: items,
            ..Default::default()
        }))
    }

    #[test]
    fn test_prefix_suffix_and_path_ignore_case() {
        let lower = Item::new("/Game/characters/sk_hero_d", "SkeletalMesh");

        let rule = prepare(Rule::new("prefix").with_name_group(PredicateGroup::necessary(
            NameMatchMode::StartWith,
            vec![RuleItem::new("SK_")],
        )));
        assert!(NameOperator.matches(&lower, &rule));

        let rule = prepare(Rule::new("suffix").with_name_group(PredicateGroup::necessary(
            NameMatchMode::EndWith,
            vec![RuleItem::new("_D")],
        )));
        assert!(NameOperator.matches(&lower, &rule));

        let rule = prepare(Rule::new("path").with_path_group(PredicateGroup::necessary(
            PathMatchMode::WithIn,
            vec![RuleItem::new("/Game/Characters/")],
        )));
        assert!(PathOperator.matches(&lower, &rule));
    }

    #[test]
    fn test_ignore_case_helpers_respect_char_boundaries() {
        assert!(!starts_with_ignore_case("Äpfel_A", "äp"));
        assert!(starts_with_ignore_case("Äpfel_A", "Äp"));
        assert!(!starts_with_ignore_case("Ä", "x"));
        assert!(!ends_with_ignore_case("T_Stein_Ü", "_ü"));
        assert!(ends_with_ignore_case("T_Stein_Ü", "_Ü"));
        assert!(!ends_with_ignore_case("Ü", "x"));
        assert!(!ends_with_ignore_case("D", "_D"));
        assert!(starts_with_ignore_case("anything", ""));
    }

    #[test]
    fn test_property_float_and_text_comparison() {
        let item = Item::new("/Game/T_Rock", "Texture2D")
            .with_property("LODBias", PropertyValue::Float(1.0))
            .with_property("CompressionSettings", PropertyValue::Text("TC_Default".to_string()))
            .with_property("SRGB", PropertyValue::Bool(true));
        let operator = PropertyOperator::default();

        let rule = property_rule(vec![
            PropertyRuleItem::new("LODBias", "1.000", PropertyMatchRule::Equal),
            PropertyRuleItem::new("CompressionSettings", "TC_Normalmap", PropertyMatchRule::NotEqual),
            PropertyRuleItem::new("SRGB", "True", PropertyMatchRule::Equal),
        ]);
        assert!(operator.matches(&item, &rule));
    }

    #[test]
    fn test_missing_property_never_matches() {
        let item = Item::new("/Game/T_Rock", "Texture2D")
            .with_property("Empty", PropertyValue::Text(String::new()));
        let operator = PropertyOperator::default();

        let rule = property_rule(vec![PropertyRuleItem::new("Missing", "x", PropertyMatchRule::NotEqual)]);
        assert!(!operator.matches(&item, &rule));
        let rule = property_rule(vec![PropertyRuleItem::new("Empty", "x", PropertyMatchRule::NotEqual)]);
        assert!(!operator.matches(&item, &rule));
    }

    #[test]
    fn test_custom_chain_last_result_wins() {
        let long_name = CustomRuleRef::new("name-length").with_param("max", json!(3));
        let never = CustomRuleRef::new("name-length").with_param("max", json!(100));

        // Optional failure keeps going, the last predicate decides.
        let rule = prepare(
            Rule::new("c")
                .with_custom_rule(never.clone().with_logic(MatchLogic::Optional))
                .with_custom_rule(long_name.clone()),
        );
        assert!(CustomOperator.matches(&hero(), &rule));

        // Necessary failure stops the chain.
        let rule = prepare(Rule::new("c").with_custom_rule(never).with_custom_rule(long_name));
        assert!(!CustomOperator.matches(&hero(), &rule));
    }

    #[test]
    fn test_chain_ands_operators() {
        let chain = OperatorChain::default();
        assert_eq!(chain.operator_names(), vec!["name", "path", "property", "custom"]);

        let rule = prepare(
            Rule::new("both")
                .with_name_group(PredicateGroup::necessary(NameMatchMode::StartWith, vec![RuleItem::new("SK_")]))
                .with_path_group(PredicateGroup::necessary(PathMatchMode::WithIn, vec![RuleItem::new("/Game/Props")])),
        );
        assert!(!chain.matches(&hero(), &rule));
    }
}
