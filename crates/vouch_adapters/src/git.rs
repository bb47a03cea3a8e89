use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, instrument};
use vouch_core::ports::RemoteStatus;
use vouch_core::Error;

/// Local repository queries through the `git` executable.
pub struct GitCli {
    workdir: PathBuf,
}

impl GitCli {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
        }
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// Run git and return trimmed stdout. A non-zero exit is an error
    /// carrying git's stderr.
    async fn run_git(&self, args: &[&str]) -> Result<String, Error> {
        debug!(args = %args.join(" "), "running git");

        let output = Command::new("git")
            .args(args)
            .current_dir(&self.workdir)
            .output()
            .await
            .map_err(|e| {
                Error::RemoteQuery(format!("failed to run 'git {}': {}", args.join(" "), e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            if stderr.contains("not a git repository") {
                return Err(Error::NotAGitRepository(stderr));
            }
            return Err(Error::RemoteQuery(format!(
                "git {} failed: {}",
                args.join(" "),
                stderr
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    async fn git_succeeds(&self, args: &[&str]) -> bool {
        Command::new("git")
            .args(args)
            .current_dir(&self.workdir)
            .output()
            .await
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    async fn run_count(&self, args: &[&str]) -> Result<u32, Error> {
        let output = self.run_git(args).await?;
        output
            .parse()
            .map_err(|_| Error::RemoteQuery(format!("unexpected commit count: {}", output)))
    }
}

#[async_trait]
impl RemoteStatus for GitCli {
    #[instrument(skip(self))]
    async fn repo_root(&self) -> Result<PathBuf, Error> {
        self.run_git(&["rev-parse", "--show-toplevel"])
            .await
            .map(PathBuf::from)
    }

    #[instrument(skip(self))]
    async fn has_uncommitted_changes(&self) -> Result<bool, Error> {
        let output = self.run_git(&["status", "--porcelain"]).await?;
        Ok(!output.is_empty())
    }

    #[instrument(skip(self))]
    async fn remote_url(&self, remote: &str) -> Result<String, Error> {
        self.run_git(&["remote", "get-url", remote]).await
    }

    #[instrument(skip(self))]
    async fn current_branch(&self) -> Result<String, Error> {
        self.run_git(&["rev-parse", "--abbrev-ref", "HEAD"]).await
    }

    #[instrument(skip(self))]
    async fn fetch(&self, remote: &str) -> Result<(), Error> {
        self.run_git(&["fetch", remote]).await.map(|_| ())
    }

    #[instrument(skip(self))]
    async fn has_remote_branch(&self, tracking_ref: &str) -> Result<bool, Error> {
        Ok(self
            .git_succeeds(&["rev-parse", "--verify", "--quiet", tracking_ref])
            .await)
    }

    #[instrument(skip(self))]
    async fn count_commits(&self, range: &str) -> Result<u32, Error> {
        self.run_count(&["rev-list", "--count", range]).await
    }

    #[instrument(skip(self))]
    async fn total_commits(&self) -> Result<u32, Error> {
        self.run_count(&["rev-list", "--count", "HEAD"]).await
    }

    #[instrument(skip(self))]
    async fn push(&self, remote: &str, branch: &str) -> Result<(), Error> {
        self.run_git(&["push", remote, branch]).await.map(|_| ())
    }

    #[instrument(skip(self))]
    async fn push_set_upstream(&self, remote: &str, branch: &str) -> Result<(), Error> {
        self.run_git(&["push", "-u", remote, branch]).await.map(|_| ())
    }
}
