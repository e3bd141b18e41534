//! # CLI Module
//!
//! This module defines the command-line interface for resscan using `clap`.
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `scan` | Scan items against the configured rules |
//! | `init` | Write a starter configuration file |
//! | `validate` | Show readiness and admission of every rule |
//!
//! ## Global Options
//!
//! - `-v, --verbose` - Increase verbosity level (use multiple times: -v, -vv, -vvv)
//! - `-c, --config <FILE>` - Path to configuration file (`resscan.toml` by default)
//! - `-C, --directory <DIR>` - Working directory (defaults to current directory)
//! - `--log-json` - Emit logs as JSON lines
//!
//! ## Examples
//!
//! ```bash
//! # Write resscan.toml
//! resscan init
//!
//! # Scan an exported registry manifest and print the lite report
//! resscan scan --manifest items.json --format lite
//!
//! # Scan the files of a content directory
//! resscan scan -c rules.yaml --content-dir Content
//! ```

pub mod commands;
pub mod exit_codes;
pub mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use commands::{InitArgs, ScanArgs, ValidateArgs};

/// resscan - Scan versioned game assets against naming, path and property rules
#[derive(Parser, Debug)]
#[command(name = "resscan")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Working directory (defaults to current directory)
    #[arg(short = 'C', long, global = true, value_name = "DIR")]
    pub directory: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan items against the configured rules
    Scan(ScanArgs),

    /// Write a starter configuration file
    Init(InitArgs),

    /// Show readiness and admission of every rule
    Validate(ValidateArgs),
}
