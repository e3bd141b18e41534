//! Rules module - Rule model, match operators and the scan engine

pub mod engine;
pub mod model;
pub mod operators;
pub mod plugins;
pub mod report;
pub mod results;

pub use engine::{RuleReadiness, RuleStatus, ScanEngine, ScanOutcome};
pub use model::{MatchLogic, Priority, Rule, RuleItem};
pub use results::{FileCommitter, MatchedResult, RuleMatch};
