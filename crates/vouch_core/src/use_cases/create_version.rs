use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, warn};

use crate::entities::BranchStatus;
use crate::error::Error;
use crate::ports::{CredentialRepository, ProviderFactory, RemoteStatus};
use crate::remote::{is_valid_version, RemoteRepository};
use crate::resolver::resolve_for_owner;
use crate::use_cases::BranchSyncUseCase;

#[derive(Debug, Clone)]
pub struct ReleaseOptions {
    /// Continue despite uncommitted changes or a branch behind its remote
    pub force: bool,
    pub skip_push: bool,
    pub remote: String,
}

impl Default for ReleaseOptions {
    fn default() -> Self {
        Self {
            force: false,
            skip_push: false,
            remote: "origin".to_string(),
        }
    }
}

/// Outcome of a successful release
#[derive(Debug, Clone)]
pub struct ReleaseReport {
    pub tag: String,
    pub repo_root: PathBuf,
    pub repo_path: String,
    pub account_name: String,
    pub status: BranchStatus,
    pub pushed: bool,
}

/// Creates a version tag on the hosting provider after checking that the
/// local branch is safe to release from.
pub struct CreateVersionUseCase<R, C, F>
where
    R: RemoteStatus,
    C: CredentialRepository,
    F: ProviderFactory,
{
    remote_status: Arc<R>,
    credentials: Arc<C>,
    providers: Arc<F>,
}

impl<R, C, F> CreateVersionUseCase<R, C, F>
where
    R: RemoteStatus,
    C: CredentialRepository,
    F: ProviderFactory,
{
    pub fn new(remote_status: Arc<R>, credentials: Arc<C>, providers: Arc<F>) -> Self {
        Self {
            remote_status,
            credentials,
            providers,
        }
    }

    /// Release `tag`.
    ///
    /// Flow:
    /// 1. Validate the tag format and locate the repository
    /// 2. Refuse a dirty working tree unless forced
    /// 3. Resolve the account from the remote URL
    /// 4. Refuse a branch behind its remote unless forced, push if ahead
    /// 5. Create the tag through the provider API
    pub async fn execute(
        &self,
        tag: &str,
        options: &ReleaseOptions,
    ) -> Result<ReleaseReport, Error> {
        if !is_valid_version(tag) {
            return Err(Error::InvalidVersion(tag.to_string()));
        }

        let repo_root = self.remote_status.repo_root().await?;

        if self.remote_status.has_uncommitted_changes().await? {
            if !options.force {
                return Err(Error::UncommittedChanges);
            }
            warn!("Releasing with uncommitted changes");
        }

        let url = self.remote_status.remote_url(&options.remote).await?;
        let remote = RemoteRepository::parse(&url)?;

        let store = self.credentials.load().await?;
        let account = resolve_for_owner(&store, &remote.domain, &remote.owner)?;
        info!(account = %account.name, repo = %remote.repo_path, "Resolved account");

        let status = BranchSyncUseCase::new(self.remote_status.clone())
            .execute(&options.remote)
            .await?;

        if status.needs_pull {
            if !options.force {
                return Err(Error::BranchBehind {
                    branch: status.branch_name.clone(),
                    remote: status.remote_name.clone(),
                    behind: status.commits_behind,
                });
            }
            warn!(
                behind = status.commits_behind,
                "Branch is behind its remote, continuing because of --force"
            );
        }

        let pushed = status.needs_push && !options.skip_push;
        if pushed {
            if status.is_new_branch {
                info!(branch = %status.branch_name, "Pushing new branch");
                self.remote_status
                    .push_set_upstream(&status.remote_name, &status.branch_name)
                    .await?;
            } else {
                info!(branch = %status.branch_name, ahead = status.commits_ahead, "Pushing branch");
                self.remote_status
                    .push(&status.remote_name, &status.branch_name)
                    .await?;
            }
        }

        let provider = self
            .providers
            .create(account.provider, &remote.base_url(), &account.token)?;
        provider.create_tag(&remote.repo_path, tag).await?;
        info!(tag, repo = %remote.repo_path, "Created tag");

        Ok(ReleaseReport {
            tag: tag.to_string(),
            repo_root,
            repo_path: remote.repo_path,
            account_name: account.name.clone(),
            status,
            pushed,
        })
    }
}
