//! Scan engine
//!
//! Builds the candidate set, narrows it per rule, drops ignored items, runs
//! the operator chain and aggregates the matches. Nothing in here aborts a
//! scan: rules that cannot run are skipped with a warning and VCS failures
//! degrade to empty results.

use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, span, warn, Instrument, Level};

use super::model::Rule;
use super::operators::{OperatorChain, PreparedRule};
use super::plugins::Plugins;
use super::results::{MatchedResult, RuleMatch};
use crate::config::{PathMarks, ScanConfig};
use crate::error::ScanError;
use crate::items::identity::ContentMount;
use crate::items::{Indexer, Item};
use crate::utils::timing::{RuleTiming, ScanTiming, ScopedTimer, Timer};
use crate::vcs::{ChangeSetResolver, CommitAttributor, VcsClient};

/// Where a rule was declared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleSource {
    /// Imported rules table
    Table,
    /// `rules` of the scan configuration
    Inline,
}

/// Whether a rule can run at all
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleReadiness {
    Disabled,
    /// No own scope filters and no global scope
    FilterMissing,
    /// No predicate group and no custom predicate that can be built
    NoRules,
    Admitted,
}

impl fmt::Display for RuleReadiness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            RuleReadiness::Disabled => "disabled",
            RuleReadiness::FilterMissing => "no scan filters",
            RuleReadiness::NoRules => "no match rules",
            RuleReadiness::Admitted => "ready",
        };
        write!(f, "{}", text)
    }
}

/// Readiness and admission of one rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleStatus {
    pub rule_name: String,
    pub rule_id: u32,
    pub source: RuleSource,
    pub readiness: RuleReadiness,
    /// Outcome of the admission policy
    pub allowed: bool,
}

impl RuleStatus {
    /// Whether the rule is scanned
    pub fn runs(&self) -> bool {
        self.allowed && self.readiness == RuleReadiness::Admitted
    }
}

/// Everything one scan produced
#[derive(Debug, Clone, Default)]
pub struct ScanOutcome {
    pub result: MatchedResult,
    pub statuses: Vec<RuleStatus>,
    pub timing: ScanTiming,
    /// Size of the global candidate set
    pub candidates: usize,
}

/// Main scan engine
pub struct ScanEngine {
    config: ScanConfig,
    marks: PathMarks,
    indexer: Arc<dyn Indexer>,
    vcs: Option<Arc<dyn VcsClient>>,
    content_dir: Option<PathBuf>,
    plugins: Plugins,
    operators: OperatorChain,
}

impl ScanEngine {
    /// Create an engine with the built-in plugins and no VCS client
    pub fn new(config: ScanConfig, indexer: Arc<dyn Indexer>) -> Self {
        Self {
            config,
            marks: PathMarks::default(),
            indexer,
            vcs: None,
            content_dir: None,
            plugins: Plugins::with_builtins(),
            operators: OperatorChain::default(),
        }
    }

    pub fn with_marks(mut self, marks: PathMarks) -> Self {
        self.marks = marks;
        self
    }

    pub fn with_vcs(mut self, vcs: Arc<dyn VcsClient>) -> Self {
        self.vcs = Some(vcs);
        self
    }

    /// Replace the configured content directory of the change-set mount
    pub fn with_content_dir(mut self, content_dir: impl Into<PathBuf>) -> Self {
        self.content_dir = Some(content_dir.into());
        self
    }

    pub fn with_plugins(mut self, plugins: Plugins) -> Self {
        self.plugins = plugins;
        self
    }

    pub fn with_operators(mut self, operators: OperatorChain) -> Self {
        self.operators = operators;
        self
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn marks(&self) -> &PathMarks {
        &self.marks
    }

    /// Readiness of a rule for the current configuration
    pub fn readiness(&self, rule: &Rule) -> RuleReadiness {
        if !rule.enable_rule {
            RuleReadiness::Disabled
        } else if rule.scan_filters.is_empty() && !self.config.uses_global_scope() {
            RuleReadiness::FilterMissing
        } else if !self.has_usable_predicates(rule) {
            RuleReadiness::NoRules
        } else {
            RuleReadiness::Admitted
        }
    }

    /// Whether a predicate family has groups or a custom predicate can be built
    fn has_usable_predicates(&self, rule: &Rule) -> bool {
        rule.has_predicate_groups()
            || rule
                .custom_rules
                .iter()
                .any(|reference| self.plugins.create_predicate(reference, &self.marks).is_ok())
    }

    /// Table rules followed by inline rules, with their effective IDs
    pub fn rules(&self) -> Vec<(RuleSource, u32, Rule)> {
        let table = self
            .config
            .table_rules(&self.marks)
            .into_iter()
            .enumerate()
            .map(|(index, rule)| (RuleSource::Table, rule.effective_id(index), rule));
        let inline = self
            .config
            .rules
            .iter()
            .cloned()
            .enumerate()
            .map(|(index, rule)| (RuleSource::Inline, rule.effective_id(index), rule));
        table.chain(inline).collect()
    }

    /// Readiness and admission of every rule, without scanning
    pub fn rule_statuses(&self) -> Vec<RuleStatus> {
        self.rules()
            .into_iter()
            .map(|(source, rule_id, rule)| self.status_of(source, rule_id, &rule))
            .collect()
    }

    fn status_of(&self, source: RuleSource, rule_id: u32, rule: &Rule) -> RuleStatus {
        RuleStatus {
            rule_name: rule.rule_name.clone(),
            rule_id,
            source,
            readiness: self.readiness(rule),
            allowed: self.config.is_allow_rule(rule, rule_id),
        }
    }

    /// Run a scan and return the aggregated matches
    pub async fn run(&self) -> MatchedResult {
        self.scan().await.result
    }

    /// Run a scan and keep rule statuses and timings
    pub async fn scan(&self) -> ScanOutcome {
        let span = span!(Level::INFO, "scan", config = %self.config.config_name);
        self.scan_all().instrument(span).await
    }

    async fn scan_all(&self) -> ScanOutcome {
        let total = Timer::start();

        info!(
            rules = self.config.rules.len(),
            rules_table = self.config.use_rules_table,
            "Starting scan"
        );
        if self.config.verbose_log {
            match serde_json::to_string_pretty(&self.config) {
                Ok(dump) => info!("Scan configuration:\n{}", dump),
                Err(e) => warn!(error = %e, "Cannot dump scan configuration"),
            }
        }

        let candidates = {
            let _timer = ScopedTimer::new("candidates");
            self.candidates().await
        };

        let mut outcome = ScanOutcome {
            candidates: candidates.len(),
            ..Default::default()
        };

        {
            let _timer = ScopedTimer::new("rules");
            for (source, rule_id, rule) in self.rules() {
                let status = self.status_of(source, rule_id, &rule);
                info!(
                    rule = %status.rule_name,
                    rule_id,
                    "Rule \"{}\" is {}",
                    status.rule_name,
                    if status.allowed { "enabled" } else { "disabled" }
                );

                if status.allowed && status.readiness != RuleReadiness::Admitted {
                    let err = ScanError::ConfigurationInvalid {
                        rule: status.rule_name.clone(),
                        reason: status.readiness.to_string(),
                    };
                    warn!(error = %err, "Skipping rule");
                }

                if status.runs() {
                    let timer = Timer::start();
                    let prepared = PreparedRule::prepare(rule, rule_id, &self.plugins, &self.marks);
                    let (rule_match, scanned) = self.scan_rule(&candidates, &prepared);
                    outcome.timing.add_rule(RuleTiming {
                        rule_name: status.rule_name.clone(),
                        candidates: scanned,
                        matched: rule_match.count(),
                        duration: timer.elapsed(),
                    });
                    outcome.result.push(rule_match);
                }
                outcome.statuses.push(status);
            }
        }

        if self.config.git_checker.should_record_committer() && outcome.result.has_valid_result() {
            let _timer = ScopedTimer::new("attribution");
            self.attribute(&mut outcome.result).await;
        }

        outcome.timing.total_duration = total.elapsed();
        info!(
            matched_rules = outcome.result.matched.len(),
            matched_items = outcome.result.total_matches(),
            elapsed = %outcome.timing.total_duration_formatted(),
            "Scan complete"
        );
        outcome
    }

    /// Global candidate set: explicit references, global scopes, change-set
    pub async fn candidates(&self) -> Vec<Item> {
        let mut items = Vec::new();

        if self.config.uses_global_scope() {
            let global = &self.config.global_scan_filters;
            items.extend(self.indexer.resolve_by_identity(&global.items));
            items.extend(self.indexer.query_items(&[], &global.scopes, true));
            debug!(items = items.len(), "Candidates by global filters");
        }

        if self.config.git_checker.enabled {
            match self.change_set_resolver().await {
                Some((vcs, resolver)) => {
                    let identities: Vec<String> = resolver
                        .resolve(vcs.as_ref(), &self.config.git_checker)
                        .await
                        .into_iter()
                        .collect();
                    let changed = self.indexer.resolve_by_identity(&identities);
                    info!(
                        repo = %resolver.repo_root().display(),
                        changed = identities.len(),
                        resolved = changed.len(),
                        "Candidates by git repository"
                    );
                    items.extend(changed);
                }
                None => warn!("Git checking is enabled but no repository is available"),
            }
        }

        let mut seen = HashSet::new();
        items.retain(|item| seen.insert(item.package_name.clone()));
        items
    }

    /// Mount used to map changed files to identities
    pub fn content_mount(&self) -> ContentMount {
        let checker = &self.config.git_checker;
        let content_dir = match &self.content_dir {
            Some(dir) => dir.clone(),
            None => self.marks.resolve(&checker.content_dir),
        };
        ContentMount::new(checker.content_mount.clone(), content_dir)
    }

    async fn repo_root(&self) -> Option<(Arc<dyn VcsClient>, PathBuf)> {
        let Some(vcs) = self.vcs.clone() else {
            warn!("No VCS client configured");
            return None;
        };
        let repo_dir = self.marks.resolve(&self.config.git_checker.repo_dir);
        match vcs.find_repo_root(&repo_dir).await {
            Some(root) => Some((vcs, root)),
            None => {
                warn!(repo = %repo_dir.display(), "Not a valid git repository");
                None
            }
        }
    }

    async fn change_set_resolver(&self) -> Option<(Arc<dyn VcsClient>, ChangeSetResolver)> {
        let (vcs, root) = self.repo_root().await?;
        Some((vcs, ChangeSetResolver::new(root, self.content_mount())))
    }

    async fn attribute(&self, result: &mut MatchedResult) {
        let Some((vcs, root)) = self.repo_root().await else {
            return;
        };
        CommitAttributor::new(root, self.content_mount())
            .attribute(vcs.as_ref(), self.indexer.as_ref(), result)
            .await;
    }

    /// Items a rule is evaluated against
    pub fn rule_items(&self, candidates: &[Item], rule: &Rule) -> Vec<Item> {
        let types = rule.asset_types();
        let global_active = self.config.uses_global_scope() || self.config.git_checker.enabled;

        if !global_active || (self.config.block_rule_filter && !rule.scan_filters.is_empty()) {
            return self
                .indexer
                .query_items(&types, &rule.scan_filters, rule.recursive_types);
        }

        let restrict_scopes = rule.global_must_match_filter && !rule.scan_filters.is_empty();
        candidates
            .iter()
            .filter(|item| {
                types.iter().all(|wanted| {
                    self.indexer
                        .type_matches(&item.item_type, wanted, rule.recursive_types)
                })
            })
            .filter(|item| {
                !restrict_scopes
                    || rule
                        .scan_filters
                        .iter()
                        .any(|scope| crate::items::identity::scope_contains(scope, item.package_path()))
            })
            .cloned()
            .collect()
    }

    /// Whether the global or the rule ignore set drops an item
    pub fn is_ignored(&self, item: &Item, rule: &Rule) -> bool {
        [&self.config.global_ignore_filters, &rule.ignore_filters]
            .iter()
            .any(|filters| filters.covers(item) || filters.references(item))
    }

    fn scan_rule(&self, candidates: &[Item], prepared: &PreparedRule) -> (RuleMatch, usize) {
        let rule = &prepared.rule;
        let span = span!(Level::INFO, "rule", rule = %rule.rule_name, rule_id = prepared.rule_id);
        let _guard = span.enter();

        if self.config.verbose_log {
            match serde_json::to_string_pretty(rule) {
                Ok(dump) => info!("Rule \"{}\" is scanning, config:\n{}", rule.rule_name, dump),
                Err(e) => warn!(error = %e, "Cannot dump rule configuration"),
            }
        }

        let items = self.rule_items(candidates, rule);
        let matched: Vec<bool> = items
            .par_iter()
            .map(|item| !self.is_ignored(item, rule) && self.operators.matches(item, prepared))
            .collect();

        let mut rule_match = RuleMatch::new(&rule.rule_name, &rule.rule_describe, prepared.rule_id);
        for (item, is_match) in items.iter().zip(matched) {
            if is_match && rule_match.add_unique(&item.package_name) && self.config.verbose_log {
                info!("\t{}", item.object_path());
            }
        }
        debug!(candidates = items.len(), matched = rule_match.count(), "Rule scanned");

        if rule.enable_post_processor && rule_match.count() > 0 {
            let item_type = rule.scan_asset_type.as_deref().unwrap_or("");
            for post in prepared.post_processors() {
                if let Err(e) = post.process(&rule_match, item_type) {
                    warn!(post_processor = post.name(), error = %e, "Post-processor failed");
                }
            }
        }

        (rule_match, items.len())
    }
}
