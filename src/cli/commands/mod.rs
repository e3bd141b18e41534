//! CLI commands module

pub mod init;
pub mod scan;
pub mod validate;

use clap::Args;
use std::path::{Path, PathBuf};

use crate::config::loader::CONFIG_FILENAME;

/// Arguments for the scan command
#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Item manifest exported from the asset registry (.json, .toml, .yaml)
    #[arg(long, value_name = "FILE", conflicts_with = "content_dir")]
    pub manifest: Option<PathBuf>,

    /// Index the content files of a directory instead of a manifest
    #[arg(long, value_name = "DIR")]
    pub content_dir: Option<PathBuf>,

    /// Output format
    #[arg(short, long, default_value = "terminal")]
    pub format: ScanFormat,

    /// Output file (defaults to stdout)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Project directory used to resolve path placeholders
    #[arg(long, value_name = "DIR")]
    pub project_dir: Option<PathBuf>,

    /// Engine directory used to resolve [ENGINE_DIR] placeholders
    #[arg(long, value_name = "DIR", env = "RESSCAN_ENGINE_DIR")]
    pub engine_dir: Option<PathBuf>,

    /// Do not write the configured config and result files
    #[arg(long)]
    pub no_save: bool,
}

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Configuration format
    #[arg(long, default_value = "toml")]
    pub format: InitFormat,

    /// Force overwrite existing configuration
    #[arg(short, long)]
    pub force: bool,
}

/// Arguments for the validate command
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Project directory used to resolve the rules table path
    #[arg(long, value_name = "DIR")]
    pub project_dir: Option<PathBuf>,
}

/// Output format for the scan command
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ScanFormat {
    Terminal,
    Json,
    Lite,
}

/// File format written by the init command
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum InitFormat {
    Toml,
    Json,
}

/// Configuration file selected by `-c` or the default name
pub(crate) fn config_path(config: Option<PathBuf>) -> PathBuf {
    config.unwrap_or_else(|| Path::new(CONFIG_FILENAME).to_path_buf())
}
