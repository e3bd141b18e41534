//! Command execution utilities
//!
//! Runs external programs with captured output and a hard timeout. The
//! child is killed when the timeout elapses.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

use crate::error::VcsError;

/// Result of a command execution
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// Exit code of the command
    pub exit_code: i32,
    /// Standard output (stdout)
    pub stdout: String,
    /// Standard error (stderr)
    pub stderr: String,
}

impl CommandResult {
    /// Check if the command succeeded (exit code 0)
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

fn display_command(program: &str, args: &[&str]) -> String {
    if args.is_empty() {
        program.to_string()
    } else {
        format!("{} {}", program, args.join(" "))
    }
}

/// Execute a command and capture its output
///
/// # Returns
/// * `Ok(CommandResult)` - The command ran to completion (any exit code)
/// * `Err(VcsError::Spawn)` - The command failed to start
/// * `Err(VcsError::Timeout)` - The command did not finish within `timeout`
pub async fn execute_command(
    program: &str,
    args: &[&str],
    working_dir: Option<&Path>,
    timeout: Duration,
) -> Result<CommandResult, VcsError> {
    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    if let Some(dir) = working_dir {
        cmd.current_dir(dir);
    }

    let child = cmd.spawn().map_err(|e| VcsError::Spawn {
        command: program.to_string(),
        source: e,
    })?;

    let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(result) => result.map_err(|e| VcsError::Spawn {
            command: program.to_string(),
            source: e,
        })?,
        Err(_elapsed) => {
            return Err(VcsError::Timeout {
                command: display_command(program, args),
                timeout,
            })
        }
    };

    Ok(CommandResult {
        exit_code: output.status.code().unwrap_or(-1),
        stdout: String::from_utf8_lossy(&output.stdout).trim_end().to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    })
}

/// Execute a command and return stdout if successful, error otherwise
pub async fn execute_command_checked(
    program: &str,
    args: &[&str],
    working_dir: Option<&Path>,
    timeout: Duration,
) -> Result<String, VcsError> {
    let result = execute_command(program, args, working_dir, timeout).await?;

    if result.success() {
        Ok(result.stdout)
    } else {
        Err(VcsError::CommandFailed {
            command: display_command(program, args),
            code: result.exit_code,
            stderr: result.stderr,
        })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    const TIMEOUT: Duration = Duration::from_secs(10);

    #[tokio::test]
    async fn test_execute_command_success() {
        let result = execute_command("echo", &["hello"], None, TIMEOUT).await.unwrap();
        assert!(result.success());
        assert_eq!(result.stdout, "hello");
        assert_eq!(result.exit_code, 0);
    }

    #[tokio::test]
    async fn test_execute_command_failure() {
        let result = execute_command("false", &[], None, TIMEOUT).await.unwrap();
        assert!(!result.success());
        assert_eq!(result.exit_code, 1);
    }

    #[tokio::test]
    async fn test_execute_command_checked_failure() {
        let result = execute_command_checked("false", &[], None, TIMEOUT).await;
        assert!(matches!(result, Err(VcsError::CommandFailed { code: 1, .. })));
    }

    #[tokio::test]
    async fn test_execute_command_not_found() {
        let result = execute_command("nonexistent_command_xyz", &[], None, TIMEOUT).await;
        assert!(matches!(result, Err(VcsError::Spawn { .. })));
    }

    #[tokio::test]
    async fn test_execute_command_timeout() {
        let result = execute_command("sleep", &["5"], None, Duration::from_millis(100)).await;
        assert!(matches!(result, Err(VcsError::Timeout { .. })));
    }
}
