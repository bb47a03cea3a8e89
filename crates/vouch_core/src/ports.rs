use std::path::PathBuf;

use async_trait::async_trait;

use crate::entities::{HostedRepository, ProviderKind, VersionTag, Visibility};
use crate::error::Error;
use crate::store::CredentialStore;

// ============================================================================
// Key Material Ports
// ============================================================================

/// OS secret store holding a single named secret (libsecret/keychain/credential manager)
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Read a secret, `None` when nothing is stored under the name
    async fn get_secret(&self, name: &str) -> Result<Option<String>, Error>;

    async fn set_secret(&self, name: &str, value: &str) -> Result<(), Error>;
}

/// Best-effort identity of the machine and invoking user, used to derive
/// a fallback key when no secret store is available.
pub trait MachineIdentity: Send + Sync {
    fn machine_id(&self) -> String;
    fn username(&self) -> String;
}

// ============================================================================
// Persistence Ports
// ============================================================================

/// Persistence of the credential store. Implementations encrypt tokens on
/// save and decrypt them on load.
#[async_trait]
pub trait CredentialRepository: Send + Sync {
    /// Load the store, returning an empty one when nothing was saved yet
    async fn load(&self) -> Result<CredentialStore, Error>;

    async fn save(&self, store: &CredentialStore) -> Result<(), Error>;

    /// Location of the backing file, for display
    fn location(&self) -> PathBuf;
}

// ============================================================================
// Local Repository Ports
// ============================================================================

/// Queries and writes against the local git working tree.
///
/// Textual results are trimmed. Any failed invocation is an error.
#[async_trait]
pub trait RemoteStatus: Send + Sync {
    async fn repo_root(&self) -> Result<PathBuf, Error>;

    async fn has_uncommitted_changes(&self) -> Result<bool, Error>;

    async fn remote_url(&self, remote: &str) -> Result<String, Error>;

    async fn current_branch(&self) -> Result<String, Error>;

    async fn fetch(&self, remote: &str) -> Result<(), Error>;

    /// Does `tracking_ref` (e.g. `origin/main`) resolve locally?
    async fn has_remote_branch(&self, tracking_ref: &str) -> Result<bool, Error>;

    /// Number of commits in a revision range such as `origin/main..HEAD`
    async fn count_commits(&self, range: &str) -> Result<u32, Error>;

    /// Number of commits reachable from HEAD
    async fn total_commits(&self) -> Result<u32, Error>;

    async fn push(&self, remote: &str, branch: &str) -> Result<(), Error>;

    async fn push_set_upstream(&self, remote: &str, branch: &str) -> Result<(), Error>;
}

// ============================================================================
// Hosting Provider Ports
// ============================================================================

/// API client for one hosting provider instance, bound to one token
#[async_trait]
pub trait VersionControlProvider: Send + Sync {
    fn api_url(&self) -> &str;

    /// Check the token and return the username it belongs to
    async fn validate_token(&self) -> Result<String, Error>;

    /// Go module repositories of `owner` (organization/group first, then
    /// user), or of the token's user when `owner` is `None`
    async fn list_repositories(
        &self,
        owner: Option<&str>,
        visibility: Visibility,
    ) -> Result<Vec<HostedRepository>, Error>;

    async fn list_versions(&self, repo_path: &str) -> Result<Vec<VersionTag>, Error>;

    /// Create `tag` on the head of the repository's default branch
    async fn create_tag(&self, repo_path: &str, tag: &str) -> Result<(), Error>;
}

/// Builds provider clients from a kind, a hosting URL and a token
pub trait ProviderFactory: Send + Sync {
    fn create(
        &self,
        kind: ProviderKind,
        url: &str,
        token: &str,
    ) -> Result<Box<dyn VersionControlProvider>, Error>;
}

