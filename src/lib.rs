//! resscan Library
//!
//! Classifies versioned content items against configurable matching rules
//! and reports which items matched which rule, optionally annotated with the
//! last person who touched each match.
//!
//! ```rust
//! use std::sync::Arc;
//! use resscan::config::ScanConfig;
//! use resscan::items::{Item, ItemIndex};
//! use resscan::rules::model::{NameMatchMode, PredicateGroup, Rule, RuleItem};
//! use resscan::rules::ScanEngine;
//!
//! let index = ItemIndex::from_items(vec![
//!     Item::new("/Game/Characters/SK_Hero", "SkeletalMesh"),
//!     Item::new("/Game/Characters/Hero_Body", "SkeletalMesh"),
//! ]);
//!
//! let mut config = ScanConfig::default();
//! config.rules.push(
//!     Rule::new("SK prefix")
//!         .with_scan_filter("/Game")
//!         .with_name_group(PredicateGroup::necessary(
//!             NameMatchMode::StartWith,
//!             vec![RuleItem::new("SK_")],
//!         )),
//! );
//!
//! let engine = ScanEngine::new(config, Arc::new(index));
//! let runtime = tokio::runtime::Runtime::new().unwrap();
//! let result = runtime.block_on(engine.run());
//! assert_eq!(result.total_matches(), 1);
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod items;
pub mod rules;
pub mod utils;
pub mod vcs;

pub use error::ResScanError;
