//! Commit attribution
//!
//! Maps every matched identity to the person who last touched it. A pending
//! working-copy edit belongs to the local user; otherwise the author of the
//! last commit wins, with the local user as the fallback.

use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::{repo_relative, VcsClient};
use crate::error::ScanError;
use crate::items::identity::ContentMount;
use crate::items::Indexer;
use crate::rules::results::{FileCommitter, MatchedResult};

/// Resolves committers for matched items of one repository
#[derive(Debug, Clone)]
pub struct CommitAttributor {
    repo_root: PathBuf,
    mount: ContentMount,
}

/// Local user name, read at most once per attribution pass
enum LocalUser {
    Unread,
    Known(String),
    Missing(String),
}

impl CommitAttributor {
    pub fn new(repo_root: impl Into<PathBuf>, mount: ContentMount) -> Self {
        Self {
            repo_root: repo_root.into(),
            mount,
        }
    }

    /// Fill the committers of every rule match and set `record_committer`
    pub async fn attribute(
        &self,
        vcs: &dyn VcsClient,
        indexer: &dyn Indexer,
        result: &mut MatchedResult,
    ) {
        let mut local_user = LocalUser::Unread;

        for rule_match in &mut result.matched {
            let mut committers = Vec::with_capacity(rule_match.matched_items.len());
            for identity in &rule_match.matched_items {
                let file = self.file_for(indexer, identity);
                let committer = match file.as_deref().and_then(|f| self.relative(f)) {
                    Some(relative) => {
                        self.committer_for(vcs, identity, &relative, &mut local_user)
                            .await
                    }
                    None => {
                        let err = ScanError::AttributionFailed {
                            item: identity.clone(),
                            reason: "file lies outside the repository".to_string(),
                        };
                        warn!(error = %err, "Skipping attribution");
                        String::new()
                    }
                };
                committers.push(FileCommitter {
                    file: file
                        .as_deref()
                        .and_then(|f| self.relative(f))
                        .unwrap_or_else(|| identity.clone()),
                    committer,
                });
            }
            rule_match.committers = committers;
        }

        result.record_committer = true;
    }

    fn file_for(&self, indexer: &dyn Indexer, identity: &str) -> Option<PathBuf> {
        let contains_map = indexer
            .resolve_by_identity(&[identity.to_string()])
            .first()
            .map(|item| item.contains_map)
            .unwrap_or(false);
        self.mount.identity_to_file(identity, contains_map)
    }

    fn relative(&self, file: &Path) -> Option<String> {
        repo_relative(&self.repo_root, file)
    }

    async fn committer_for(
        &self,
        vcs: &dyn VcsClient,
        identity: &str,
        file: &str,
        local_user: &mut LocalUser,
    ) -> String {
        match vcs.file_status(&self.repo_root, file).await {
            Ok(status) if status.is_edited() => {
                debug!(file, ?status, "Pending edit, attributing to local user");
                return self.local_user(vcs, identity, local_user).await;
            }
            Ok(_) => {}
            Err(e) => debug!(file, error = %e, "Unknown file status"),
        }

        match vcs.last_commit(&self.repo_root, file).await {
            Ok(Some(revision)) if !revision.user_name.is_empty() => revision.user_name,
            Ok(_) => self.local_user(vcs, identity, local_user).await,
            Err(e) => {
                debug!(file, error = %e, "No commit history");
                self.local_user(vcs, identity, local_user).await
            }
        }
    }

    async fn local_user(&self, vcs: &dyn VcsClient, identity: &str, cached: &mut LocalUser) -> String {
        if matches!(cached, LocalUser::Unread) {
            *cached = match vcs.local_user_name(&self.repo_root).await {
                Ok(name) => LocalUser::Known(name),
                Err(e) => LocalUser::Missing(e.to_string()),
            };
        }

        match cached {
            LocalUser::Known(name) => name.clone(),
            LocalUser::Missing(reason) => {
                let err = ScanError::AttributionFailed {
                    item: identity.to_string(),
                    reason: reason.clone(),
                };
                warn!(error = %err, "Leaving committer empty");
                String::new()
            }
            LocalUser::Unread => String::new(),
        }
    }
}
