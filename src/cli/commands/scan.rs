//! Scan command - Match items against the configured rules

use colored::Colorize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, span, warn, Instrument, Level};

use super::{config_path, ScanArgs, ScanFormat};
use crate::cli::exit_codes;
use crate::cli::output::{JsonOutput, LiteOutput, ReportRenderer, TerminalOutput};
use crate::config::{PathMarks, ScanConfig};
use crate::error::{ReportError, ResScanError};
use crate::items::filesystem::scan_content_dir;
use crate::items::identity::ContentMount;
use crate::items::manifest::ItemManifest;
use crate::items::{Indexer, ItemIndex};
use crate::rules::report::save_outputs;
use crate::rules::ScanEngine;
use crate::vcs::GitCli;

pub async fn execute(config: Option<PathBuf>, args: ScanArgs) -> Result<i32, ResScanError> {
    run(config, args)
        .instrument(span!(Level::INFO, "scan_command"))
        .await
}

async fn run(config: Option<PathBuf>, args: ScanArgs) -> Result<i32, ResScanError> {
    let config = load_config(config)?;
    let project_dir = match &args.project_dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().map_err(|e| ReportError::FileWrite {
            path: ".".to_string(),
            source: e,
        })?,
    };
    let marks = PathMarks::for_project(project_dir, args.engine_dir.clone());

    eprintln!("{}", "Indexing items...".dimmed());
    let index = build_index(&args, &config, &marks)?;
    info!(items = index.len(), "Item index ready");

    let mut engine = ScanEngine::new(config, Arc::new(index) as Arc<dyn Indexer>)
        .with_marks(marks);
    if let Some(dir) = &args.content_dir {
        engine = engine.with_content_dir(dir.clone());
    }

    if engine.config().git_checker.enabled {
        let git = GitCli::from_checker(&engine.config().git_checker);
        match git {
            Ok(git) => engine = engine.with_vcs(Arc::new(git)),
            Err(e) => warn!(error = %e, "Git is unavailable, continuing without change sets"),
        }
    }

    eprintln!("{}", "Scanning...".dimmed());
    let outcome = engine.scan().await;

    if !args.no_save {
        let saved = save_outputs(engine.config(), engine.marks(), &outcome.result)?;
        if let Some(path) = &saved.result_file {
            eprintln!("{} {}", "Result saved:".dimmed(), path.display());
        }
    }

    let rendered = match args.format {
        ScanFormat::Terminal => TerminalOutput::new().render_report(&outcome)?,
        ScanFormat::Json => JsonOutput::new().render_report(&outcome)?,
        ScanFormat::Lite => LiteOutput::new().render_report(&outcome)?,
    };

    match &args.output {
        Some(path) => {
            write_report(path, &rendered)?;
            eprintln!(
                "{} {}",
                "Report written to".green(),
                path.display().to_string().cyan()
            );
        }
        None => println!("{}", rendered),
    }

    if outcome.result.has_valid_result() {
        Ok(exit_codes::MATCHES_FOUND)
    } else {
        Ok(exit_codes::SUCCESS)
    }
}

fn load_config(config: Option<PathBuf>) -> Result<ScanConfig, ResScanError> {
    let explicit = config.is_some();
    let path = config_path(config);
    if path.exists() || explicit {
        ScanConfig::load_from_file(&path)
    } else {
        warn!(path = %path.display(), "No configuration file, using defaults");
        Ok(ScanConfig::default())
    }
}

/// Item index from the manifest, the given content directory, or the
/// configured content directory. A given content directory also backs the
/// change-set mount.
fn build_index(
    args: &ScanArgs,
    config: &ScanConfig,
    marks: &PathMarks,
) -> Result<ItemIndex, ResScanError> {
    if let Some(manifest) = &args.manifest {
        return Ok(ItemManifest::load_from_file(manifest)?.into_index());
    }

    let checker = &config.git_checker;
    let content_dir = match &args.content_dir {
        Some(dir) => dir.clone(),
        None => marks.resolve(&checker.content_dir),
    };
    let mount = ContentMount::new(checker.content_mount.clone(), content_dir);
    Ok(scan_content_dir(&mount))
}

fn write_report(path: &Path, content: &str) -> Result<(), ReportError> {
    fs::write(path, content).map_err(|e| ReportError::FileWrite {
        path: path.display().to_string(),
        source: e,
    })
}
