//! Validate command - Report which rules would run

use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;

use super::{config_path, ValidateArgs};
use crate::cli::exit_codes;
use crate::config::{PathMarks, ScanConfig};
use crate::error::ResScanError;
use crate::items::ItemIndex;
use crate::rules::engine::RuleSource;
use crate::rules::{RuleReadiness, ScanEngine};

pub async fn execute(config: Option<PathBuf>, args: ValidateArgs) -> Result<i32, ResScanError> {
    let path = config_path(config);
    let config = ScanConfig::load_from_file(&path)?;

    let marks = match args.project_dir {
        Some(dir) => PathMarks::for_project(dir, None),
        None => PathMarks::default(),
    };
    let engine = ScanEngine::new(config, Arc::new(ItemIndex::new())).with_marks(marks);
    let statuses = engine.rule_statuses();

    println!(
        "{} {} ({} rules)",
        "Configuration:".dimmed(),
        path.display().to_string().white().bold(),
        statuses.len()
    );

    for status in &statuses {
        let source = match status.source {
            RuleSource::Table => "table",
            RuleSource::Inline => "inline",
        };
        let readiness = match status.readiness {
            RuleReadiness::Admitted => status.readiness.to_string().green(),
            _ => status.readiness.to_string().yellow(),
        };
        let admission = if status.allowed {
            "allowed".green()
        } else {
            "not allowed".red()
        };
        println!(
            "  [{}:{}] {} - {}, {}",
            source,
            status.rule_id,
            status.rule_name.bold(),
            readiness,
            admission
        );
    }

    let running = statuses.iter().filter(|s| s.runs()).count();
    println!("\n{} of {} rules will run", running, statuses.len());

    Ok(exit_codes::SUCCESS)
}
