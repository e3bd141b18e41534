//! Init command - Write a starter configuration file

use colored::Colorize;
use std::fs;
use std::path::{Path, PathBuf};

use super::{InitArgs, InitFormat};
use crate::cli::exit_codes;
use crate::config::loader::CONFIG_FILENAME;
use crate::config::ScanConfig;
use crate::error::{ReportError, ResScanError};

pub async fn execute(config: Option<PathBuf>, args: InitArgs) -> Result<i32, ResScanError> {
    let config_path = match (config, args.format) {
        (Some(path), _) => path,
        (None, InitFormat::Toml) => Path::new(CONFIG_FILENAME).to_path_buf(),
        (None, InitFormat::Json) => Path::new(CONFIG_FILENAME).with_extension("json"),
    };

    if config_path.exists() && !args.force {
        eprintln!(
            "{} {} already exists. Use --force to overwrite.",
            "Error:".red().bold(),
            config_path.display()
        );
        return Ok(exit_codes::INVALID_ARGS);
    }

    let starter = ScanConfig::starter();
    let content = match args.format {
        InitFormat::Toml if config_path.extension().is_none() => starter.to_toml()?,
        InitFormat::Json if config_path.extension().is_none() => starter.to_json()?,
        _ => starter.to_format_of(&config_path)?,
    };

    fs::write(&config_path, &content).map_err(|e| ReportError::FileWrite {
        path: config_path.display().to_string(),
        source: e,
    })?;

    println!(
        "{} Created {}",
        "Success:".green().bold(),
        config_path.display().to_string().cyan()
    );
    println!("\nNext steps:");
    println!(
        "  1. Review the rules in {}",
        config_path.display().to_string().cyan()
    );
    println!("  2. Run {} to check them", "resscan validate".cyan());
    println!(
        "  3. Run {} to scan",
        "resscan scan --manifest <items.json>".cyan()
    );

    Ok(exit_codes::SUCCESS)
}
