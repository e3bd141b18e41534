//! Git client backed by the `git` executable
//!
//! Every query runs `git -C <repo> ...` through
//! [`crate::utils::command::execute_command`] with the configured timeout.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, trace};

use super::{ChangedFiles, FileStatus, RevisionData, VcsClient};
use crate::config::GitChecker;
use crate::error::VcsError;
use crate::utils::command::{execute_command, execute_command_checked};

/// Default timeout of a single git invocation
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Git command line client
#[derive(Debug, Clone)]
pub struct GitCli {
    binary: PathBuf,
    timeout: Duration,
}

impl GitCli {
    /// Create a client for an explicit git binary
    pub fn new(binary: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            timeout,
        }
    }

    /// Locate `binary` on the `PATH`
    ///
    /// # Errors
    ///
    /// Returns [`VcsError::Unavailable`] if the binary cannot be found
    pub fn detect(binary: &str, timeout: Duration) -> Result<Self, VcsError> {
        let resolved = which::which(binary)
            .map_err(|e| VcsError::Unavailable(format!("'{}' not found: {}", binary, e)))?;
        debug!(git = %resolved.display(), "Using git binary");
        Ok(Self::new(resolved, timeout))
    }

    /// Build a client from the git checker settings
    pub fn from_checker(checker: &GitChecker) -> Result<Self, VcsError> {
        Self::detect(
            &checker.git_binary,
            Duration::from_secs(checker.timeout_secs.max(1)),
        )
    }

    /// Timeout applied to each invocation
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn program(&self) -> String {
        self.binary.to_string_lossy().into_owned()
    }

    async fn run(&self, repo_root: &Path, args: &[&str]) -> Result<String, VcsError> {
        let repo = repo_root.to_string_lossy();
        let mut full_args = vec!["-C", repo.as_ref(), "-c", "core.quotepath=false"];
        full_args.extend_from_slice(args);
        trace!(args = ?full_args, "Running git");
        execute_command_checked(&self.program(), &full_args, None, self.timeout).await
    }
}

#[async_trait]
impl VcsClient for GitCli {
    async fn status(&self, repo_root: &Path) -> Result<Vec<String>, VcsError> {
        let output = self.run(repo_root, &["status", "--porcelain", "-uall"]).await?;
        Ok(parse_porcelain(&output)
            .into_iter()
            .map(|(_, path)| path)
            .collect())
    }

    async fn diff(&self, repo_root: &Path, from: &str, to: &str) -> Result<ChangedFiles, VcsError> {
        let repo = repo_root.to_string_lossy();
        let args = [
            "-C",
            repo.as_ref(),
            "-c",
            "core.quotepath=false",
            "diff",
            "--name-only",
            from,
            to,
        ];
        let result = execute_command(&self.program(), &args, None, self.timeout).await?;
        if !result.success() {
            return Err(VcsError::CommandFailed {
                command: format!("git diff --name-only {} {}", from, to),
                code: result.exit_code,
                stderr: result.stderr,
            });
        }

        let errors = result
            .stderr
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect();
        Ok(ChangedFiles {
            files: parse_name_list(&result.stdout),
            errors,
        })
    }

    async fn file_status(&self, repo_root: &Path, file: &str) -> Result<FileStatus, VcsError> {
        let output = self
            .run(repo_root, &["status", "--porcelain", "--", file])
            .await?;
        Ok(parse_porcelain(&output)
            .into_iter()
            .next()
            .map(|(status, _)| status)
            .unwrap_or(FileStatus::NoEdit))
    }

    async fn last_commit(&self, repo_root: &Path, file: &str) -> Result<Option<RevisionData>, VcsError> {
        let output = self
            .run(
                repo_root,
                &["log", "-1", "--format=%H%x09%an%x09%ae%x09%at", "--", file],
            )
            .await?;
        parse_log_line(&output)
    }

    async fn local_user_name(&self, repo_root: &Path) -> Result<String, VcsError> {
        let output = self.run(repo_root, &["config", "user.name"]).await?;
        let name = output.trim();
        if name.is_empty() {
            return Err(VcsError::Parse("user.name is empty".to_string()));
        }
        Ok(name.to_string())
    }
}

/// Parse `git status --porcelain` output into `(status, path)` pairs
///
/// Renames report their new path.
pub fn parse_porcelain(output: &str) -> Vec<(FileStatus, String)> {
    output
        .lines()
        .filter(|line| line.len() > 3)
        .filter_map(|line| {
            let (code, rest) = line.split_at(2);
            let path = rest.strip_prefix(' ')?;
            let path = match path.rsplit_once(" -> ") {
                Some((_, new)) => new,
                None => path,
            };
            let path = unquote(path);
            (!path.is_empty()).then(|| (FileStatus::from_porcelain(code), path))
        })
        .collect()
}

/// Parse a `--name-only` listing
pub fn parse_name_list(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(unquote)
        .collect()
}

/// Parse the tab-separated `log -1` line
pub fn parse_log_line(output: &str) -> Result<Option<RevisionData>, VcsError> {
    let line = output.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() != 4 {
        return Err(VcsError::Parse(format!("unexpected log line '{}'", line)));
    }
    let timestamp = fields[3]
        .parse::<i64>()
        .map_err(|e| VcsError::Parse(format!("bad timestamp '{}': {}", fields[3], e)))?;

    Ok(Some(RevisionData {
        commit: fields[0].to_string(),
        user_name: fields[1].to_string(),
        email: fields[2].to_string(),
        timestamp,
    }))
}

/// Strip the C-style quoting git applies to unusual paths
fn unquote(path: &str) -> String {
    let Some(inner) = path
        .strip_prefix('"')
        .and_then(|p| p.strip_suffix('"'))
    else {
        return path.to_string();
    };

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_porcelain() {
        let output = " M Content/Characters/SK_Hero.uasset\n\
                      ?? Content/Maps/Lobby.umap\n\
                      R  Content/Old.uasset -> Content/New.uasset\n\
                      A  \"Content/With Space.uasset\"";
        let parsed = parse_porcelain(output);
        assert_eq!(parsed.len(), 4);
        assert_eq!(
            parsed[0],
            (FileStatus::Modified, "Content/Characters/SK_Hero.uasset".to_string())
        );
        assert_eq!(parsed[1].0, FileStatus::Untracked);
        assert_eq!(parsed[2], (FileStatus::Renamed, "Content/New.uasset".to_string()));
        assert_eq!(parsed[3].1, "Content/With Space.uasset");
    }

    #[test]
    fn test_parse_name_list() {
        let files = parse_name_list("Content/A.uasset\n\nContent/B.umap\n");
        assert_eq!(files, vec!["Content/A.uasset", "Content/B.umap"]);
    }

    #[test]
    fn test_parse_log_line() {
        let revision = parse_log_line("abc123\tJane Doe\tjane@example.com\t1700000000")
            .unwrap()
            .unwrap();
        assert_eq!(revision.user_name, "Jane Doe");
        assert_eq!(revision.timestamp, 1_700_000_000);

        assert!(parse_log_line("").unwrap().is_none());
        assert!(parse_log_line("garbage").is_err());
    }

    #[test]
    fn test_unquote() {
        assert_eq!(unquote("plain.uasset"), "plain.uasset");
        assert_eq!(unquote("\"a\\\"b.uasset\""), "a\"b.uasset");
    }

    #[test]
    fn test_detect_missing_binary() {
        let result = GitCli::detect("definitely-not-a-git-binary-xyz", DEFAULT_TIMEOUT);
        assert!(matches!(result, Err(VcsError::Unavailable(_))));
    }
}
