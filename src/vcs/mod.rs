//! VCS module - Version control queries, change-sets and commit attribution
//!
//! The engine talks to version control only through [`VcsClient`]. The
//! production implementation is [`git::GitCli`], which shells out to the
//! `git` binary; tests substitute an in-memory fake.

pub mod attribution;
pub mod changeset;
pub mod git;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::VcsError;

pub use attribution::CommitAttributor;
pub use changeset::ChangeSetResolver;
pub use git::GitCli;

/// Working-copy status of one file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    /// No pending local change
    NoEdit,
    Modified,
    Added,
    Deleted,
    Renamed,
    Untracked,
    Conflicted,
}

impl FileStatus {
    /// Whether the file carries a pending local edit
    pub fn is_edited(self) -> bool {
        self != FileStatus::NoEdit
    }

    /// Parse the two status letters of a porcelain line
    pub fn from_porcelain(code: &str) -> Self {
        let mut chars = code.chars();
        let index = chars.next().unwrap_or(' ');
        let worktree = chars.next().unwrap_or(' ');
        match (index, worktree) {
            ('?', '?') => FileStatus::Untracked,
            ('U', _) | (_, 'U') | ('A', 'A') | ('D', 'D') => FileStatus::Conflicted,
            ('R', _) | (_, 'R') => FileStatus::Renamed,
            ('A', _) => FileStatus::Added,
            ('D', _) | (_, 'D') => FileStatus::Deleted,
            (' ', ' ') => FileStatus::NoEdit,
            _ => FileStatus::Modified,
        }
    }
}

/// Last commit touching a file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionData {
    /// Commit hash
    pub commit: String,
    /// Author name
    pub user_name: String,
    /// Author email
    pub email: String,
    /// Author timestamp (seconds since the epoch)
    pub timestamp: i64,
}

/// Output of a diff query
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangedFiles {
    /// Repository-relative changed files
    pub files: Vec<String>,
    /// Non-fatal messages emitted by the VCS
    pub errors: Vec<String>,
}

/// Synchronous-in-spirit version control collaborator
///
/// Every method maps to one external query. Implementations must bound each
/// query with a timeout and report failures as [`VcsError`].
#[async_trait]
pub trait VcsClient: Send + Sync {
    /// Repository-relative files with pending changes
    async fn status(&self, repo_root: &Path) -> Result<Vec<String>, VcsError>;

    /// Repository-relative files changed between two revisions
    async fn diff(&self, repo_root: &Path, from: &str, to: &str) -> Result<ChangedFiles, VcsError>;

    /// Working-copy status of one repository-relative file
    async fn file_status(&self, repo_root: &Path, file: &str) -> Result<FileStatus, VcsError>;

    /// Last commit touching a repository-relative file, if any
    async fn last_commit(&self, repo_root: &Path, file: &str) -> Result<Option<RevisionData>, VcsError>;

    /// Locally configured user name
    async fn local_user_name(&self, repo_root: &Path) -> Result<String, VcsError>;

    /// Root of the repository containing `path`
    async fn find_repo_root(&self, path: &Path) -> Option<PathBuf> {
        find_repo_root(path)
    }
}

/// Walk up from `path` until a directory containing `.git` is found
pub fn find_repo_root(path: &Path) -> Option<PathBuf> {
    path.ancestors()
        .find(|dir| dir.join(".git").exists())
        .map(Path::to_path_buf)
}

/// Express `file` relative to `repo_root` with forward slashes
pub fn repo_relative(repo_root: &Path, file: &Path) -> Option<String> {
    let relative = file.strip_prefix(repo_root).ok()?;
    let relative = relative.to_str()?.replace('\\', "/");
    (!relative.is_empty()).then_some(relative)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_file_status_from_porcelain() {
        assert_eq!(FileStatus::from_porcelain(" M"), FileStatus::Modified);
        assert_eq!(FileStatus::from_porcelain("M "), FileStatus::Modified);
        assert_eq!(FileStatus::from_porcelain("??"), FileStatus::Untracked);
        assert_eq!(FileStatus::from_porcelain("A "), FileStatus::Added);
        assert_eq!(FileStatus::from_porcelain(" D"), FileStatus::Deleted);
        assert_eq!(FileStatus::from_porcelain("R "), FileStatus::Renamed);
        assert_eq!(FileStatus::from_porcelain("UU"), FileStatus::Conflicted);
        assert!(!FileStatus::NoEdit.is_edited());
        assert!(FileStatus::Untracked.is_edited());
    }

    #[test]
    fn test_find_repo_root() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join(".git")).unwrap();
        fs::create_dir_all(dir.path().join("Content/Maps")).unwrap();

        let found = find_repo_root(&dir.path().join("Content/Maps")).unwrap();
        assert_eq!(found, dir.path());
    }

    #[test]
    fn test_repo_relative() {
        let root = Path::new("/work/game");
        assert_eq!(
            repo_relative(root, Path::new("/work/game/Content/A.uasset")),
            Some("Content/A.uasset".to_string())
        );
        assert_eq!(repo_relative(root, Path::new("/elsewhere/A.uasset")), None);
    }
}
