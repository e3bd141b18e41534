//! Error types for resscan
//!
//! This module defines custom error types using `thiserror`. Nothing in the
//! scan core is fatal: scan-time errors are built and logged, and only
//! configuration loading and report writing bubble up to the CLI.

use std::time::Duration;
use thiserror::Error;

/// Main error type for resscan
#[derive(Error, Debug)]
pub enum ResScanError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Version control errors
    #[error("VCS error: {0}")]
    Vcs(#[from] VcsError),

    /// Scan-related errors
    #[error("Scan error: {0}")]
    Scan(#[from] ScanError),

    /// Report output errors
    #[error("Report error: {0}")]
    Report(#[from] ReportError),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Errors raised while loading or saving a scan configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read a configuration file
    #[error("Failed to read config '{path}': {source}")]
    FileRead {
        /// Path to the file that failed to read
        path: String,
        /// The underlying I/O error
        source: std::io::Error,
    },

    /// The configuration file could not be parsed
    #[error("Failed to parse config '{path}': {message}")]
    Parse {
        /// Path to the offending file
        path: String,
        /// Parser message
        message: String,
    },

    /// The file extension does not map to a known format
    #[error("Unsupported config format for '{path}' (expected .toml, .json, .yaml or .yml)")]
    UnsupportedFormat {
        /// Path with the unknown extension
        path: String,
    },

    /// A rule references a plugin nobody registered
    #[error("Unknown plugin '{kind}'")]
    UnknownPlugin {
        /// Plugin kind as written in the rule
        kind: String,
    },

    /// A plugin was found but its parameters are unusable
    #[error("Invalid parameters for plugin '{kind}': {message}")]
    InvalidPlugin {
        /// Plugin kind
        kind: String,
        /// What is wrong with the parameters
        message: String,
    },
}

/// Errors from the version control collaborator
#[derive(Error, Debug)]
pub enum VcsError {
    /// The VCS binary is missing or the path is not a repository
    #[error("VCS unavailable: {0}")]
    Unavailable(String),

    /// The VCS command ran but exited with a failure
    #[error("'{command}' failed with exit code {code}: {stderr}")]
    CommandFailed {
        /// Command line that failed
        command: String,
        /// Exit code (-1 when killed by a signal)
        code: i32,
        /// Captured standard error
        stderr: String,
    },

    /// The VCS command did not finish in time
    #[error("'{command}' timed out after {timeout:?}")]
    Timeout {
        /// Command line that hung
        command: String,
        /// Timeout that elapsed
        timeout: Duration,
    },

    /// The command could not be spawned
    #[error("Failed to execute '{command}': {source}")]
    Spawn {
        /// Program that failed to start
        command: String,
        /// The underlying I/O error
        source: std::io::Error,
    },

    /// The output of the command could not be understood
    #[error("Unparsable VCS output: {0}")]
    Parse(String),
}

/// Recoverable errors raised during a scan
#[derive(Error, Debug)]
pub enum ScanError {
    /// A rule cannot be evaluated and is skipped
    #[error("Rule '{rule}' is invalid: {reason}")]
    ConfigurationInvalid {
        /// Rule name
        rule: String,
        /// Why it was skipped
        reason: String,
    },

    /// An identity does not resolve to a known item
    #[error("Item '{identity}' cannot be resolved")]
    ItemUnresolvable {
        /// The identity that was looked up
        identity: String,
    },

    /// No committer could be determined for a matched item
    #[error("Cannot attribute '{item}' to a committer: {reason}")]
    AttributionFailed {
        /// Matched item identity
        item: String,
        /// Last failure in the fallback chain
        reason: String,
    },
}

/// Errors raised while writing reports
#[derive(Error, Debug)]
pub enum ReportError {
    /// Failed to write a report file
    #[error("Failed to write '{path}': {source}")]
    FileWrite {
        /// Path to the file that failed to write
        path: String,
        /// The underlying I/O error
        source: std::io::Error,
    },
}

impl From<serde_json::Error> for ResScanError {
    fn from(err: serde_json::Error) -> Self {
        ResScanError::Serialization(err.to_string())
    }
}

impl From<toml::ser::Error> for ResScanError {
    fn from(err: toml::ser::Error) -> Self {
        ResScanError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for ResScanError {
    fn from(err: serde_yaml::Error) -> Self {
        ResScanError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = ResScanError::Config(ConfigError::UnknownPlugin {
            kind: "does-not-exist".to_string(),
        });
        assert_eq!(
            err.to_string(),
            "Configuration error: Unknown plugin 'does-not-exist'"
        );
    }

    #[test]
    fn test_vcs_timeout_display() {
        let err = VcsError::Timeout {
            command: "git status".to_string(),
            timeout: Duration::from_secs(2),
        };
        assert!(err.to_string().contains("timed out after 2s"));
    }
}
