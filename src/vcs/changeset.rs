//! Change-set resolution
//!
//! Turns the files reported by `git diff` and `git status` into item
//! identities for incremental scans.

use std::collections::BTreeSet;
use std::path::PathBuf;
use tracing::{debug, warn};

use super::VcsClient;
use crate::config::GitChecker;
use crate::items::identity::ContentMount;

/// Maps VCS change reports of one repository onto a content mount
#[derive(Debug, Clone)]
pub struct ChangeSetResolver {
    repo_root: PathBuf,
    mount: ContentMount,
}

impl ChangeSetResolver {
    pub fn new(repo_root: impl Into<PathBuf>, mount: ContentMount) -> Self {
        Self {
            repo_root: repo_root.into(),
            mount,
        }
    }

    pub fn repo_root(&self) -> &std::path::Path {
        &self.repo_root
    }

    /// Identities changed according to the enabled modes of `checker`
    ///
    /// A failing mode contributes nothing and logs a warning.
    pub async fn resolve(&self, vcs: &dyn VcsClient, checker: &GitChecker) -> BTreeSet<String> {
        let mut identities = BTreeSet::new();

        if checker.diff_commit {
            identities.extend(self.diff_identities(vcs, checker).await);
        }
        if checker.uncommitted_files {
            identities.extend(self.status_identities(vcs).await);
        }

        debug!(
            repo = %self.repo_root.display(),
            changed = identities.len(),
            "Resolved change-set"
        );
        identities
    }

    async fn diff_identities(&self, vcs: &dyn VcsClient, checker: &GitChecker) -> BTreeSet<String> {
        let begin = checker.begin_commit.trim();
        let end = checker.end_revision();
        if begin.is_empty() {
            warn!("diff_commit is set but begin_commit is empty");
            return BTreeSet::new();
        }

        match vcs.diff(&self.repo_root, begin, end).await {
            Ok(changed) => {
                for message in &changed.errors {
                    warn!(from = begin, to = end, message = %message, "git diff reported an error");
                }
                self.identities_from_files(&changed.files)
            }
            Err(e) => {
                warn!(from = begin, to = end, error = %e, "Failed to diff revisions");
                BTreeSet::new()
            }
        }
    }

    async fn status_identities(&self, vcs: &dyn VcsClient) -> BTreeSet<String> {
        match vcs.status(&self.repo_root).await {
            Ok(files) => self.identities_from_files(&files),
            Err(e) => {
                warn!(error = %e, "Failed to read working copy status");
                BTreeSet::new()
            }
        }
    }

    /// Convert repository-relative files into identities
    ///
    /// Non-content files, files outside the content directory and invalid
    /// identities are dropped.
    pub fn identities_from_files(&self, files: &[String]) -> BTreeSet<String> {
        files
            .iter()
            .filter_map(|file| {
                let absolute = self.repo_root.join(file.trim());
                self.mount.file_to_identity(&absolute)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> ChangeSetResolver {
        ChangeSetResolver::new(
            "/work/game",
            ContentMount::new("/Game", "/work/game/Content"),
        )
    }

    #[test]
    fn test_identities_from_files() {
        let files = vec![
            "Content/Characters/SK_Hero.uasset".to_string(),
            "Content/Maps/Lobby.umap".to_string(),
            "Content/readme.txt".to_string(),
            "Source/Game.cpp".to_string(),
            "Content/Bad Name.uasset".to_string(),
        ];
        let identities = resolver().identities_from_files(&files);
        assert_eq!(
            identities.into_iter().collect::<Vec<_>>(),
            vec!["/Game/Characters/SK_Hero", "/Game/Maps/Lobby"]
        );
    }

    #[test]
    fn test_identities_are_order_insensitive() {
        let resolver = resolver();
        let forward = vec![
            "Content/A.uasset".to_string(),
            "Content/B.uasset".to_string(),
            "Content/A.uasset".to_string(),
        ];
        let mut backward = forward.clone();
        backward.reverse();
        assert_eq!(
            resolver.identities_from_files(&forward),
            resolver.identities_from_files(&backward)
        );
    }
}
