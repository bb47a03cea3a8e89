use std::sync::Arc;

use tracing::{debug, warn};

use crate::entities::BranchStatus;
use crate::error::Error;
use crate::ports::RemoteStatus;

/// Classifies the current branch against its counterpart on a remote.
pub struct BranchSyncUseCase<R>
where
    R: RemoteStatus,
{
    remote_status: Arc<R>,
}

impl<R> BranchSyncUseCase<R>
where
    R: RemoteStatus,
{
    pub fn new(remote_status: Arc<R>) -> Self {
        Self { remote_status }
    }

    /// Compute the status of the current branch against `remote`.
    ///
    /// Flow:
    /// 1. Resolve the current branch
    /// 2. Fetch from the remote (best effort, failure marks the status degraded)
    /// 3. Without a tracking ref the branch is new and every commit is ahead
    /// 4. Otherwise count commits on each side of the tracking ref
    pub async fn execute(&self, remote: &str) -> Result<BranchStatus, Error> {
        let branch = self.remote_status.current_branch().await?;

        let degraded = match self.remote_status.fetch(remote).await {
            Ok(()) => false,
            Err(e) => {
                warn!(remote, error = %e, "Fetch failed, using local remote-tracking refs");
                true
            }
        };

        let tracking_ref = format!("{}/{}", remote, branch);
        if !self.remote_status.has_remote_branch(&tracking_ref).await? {
            let total = self.remote_status.total_commits().await?;
            debug!(branch = %branch, remote, total, "Branch not on remote");
            return Ok(BranchStatus::new_branch(&branch, remote, total).with_degraded(degraded));
        }

        let ahead = self
            .remote_status
            .count_commits(&format!("{}..HEAD", tracking_ref))
            .await?;
        let behind = self
            .remote_status
            .count_commits(&format!("HEAD..{}", tracking_ref))
            .await?;

        debug!(branch = %branch, remote, ahead, behind, "Computed branch status");
        Ok(BranchStatus::tracked(&branch, remote, ahead, behind).with_degraded(degraded))
    }
}
