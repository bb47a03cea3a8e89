use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Hosting provider an account authenticates against.
///
/// The set is closed: an unknown tag is rejected when it is parsed, never
/// when a client is built from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    GitHub,
    GitLab,
}

impl ProviderKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ProviderKind::GitHub => "github",
            ProviderKind::GitLab => "gitlab",
        }
    }

    /// Guess the provider from a hosting domain. Self-hosted domains that
    /// don't mention either provider are assumed to be GitLab instances.
    pub fn detect(domain: &str) -> Self {
        let domain = domain.to_lowercase();
        if domain.contains("github") {
            ProviderKind::GitHub
        } else {
            ProviderKind::GitLab
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "github" => Ok(ProviderKind::GitHub),
            "gitlab" => Ok(ProviderKind::GitLab),
            other => Err(Error::UnsupportedProvider(other.to_string())),
        }
    }
}

/// Strip the scheme and any trailing slash so `https://github.com/` and
/// `github.com` compare equal.
pub fn normalize_domain(domain: &str) -> String {
    let domain = domain.trim();
    let domain = domain
        .strip_prefix("https://")
        .or_else(|| domain.strip_prefix("http://"))
        .unwrap_or(domain);
    domain.strip_suffix('/').unwrap_or(domain).to_string()
}

/// A named credential bound to one hosting domain.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub name: String,
    pub provider: ProviderKind,
    pub api_url: String,
    pub domain: String,
    /// Plaintext while in memory, ciphertext on disk.
    pub token: String,
    /// Owners (users or organizations) this account is scoped to. Empty
    /// means the account accepts every owner on its domain.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub owners: Vec<String>,
}

impl Account {
    pub fn new(
        name: impl Into<String>,
        provider: ProviderKind,
        api_url: impl Into<String>,
        domain: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            provider,
            api_url: api_url.into(),
            domain: domain.into(),
            token: token.into(),
            owners: Vec::new(),
        }
    }

    pub fn with_owners<I, S>(mut self, owners: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.owners = owners.into_iter().map(Into::into).collect();
        self
    }

    pub fn has_owner(&self, owner: &str) -> bool {
        self.owners.iter().any(|o| o == owner)
    }

    pub fn is_wildcard(&self) -> bool {
        self.owners.is_empty()
    }

    pub fn matches_domain(&self, normalized: &str) -> bool {
        normalize_domain(&self.domain) == normalized
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("name", &self.name)
            .field("provider", &self.provider)
            .field("api_url", &self.api_url)
            .field("domain", &self.domain)
            .field("token", &"<redacted>")
            .field("owners", &self.owners)
            .finish()
    }
}

/// A tag published on a remote repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionTag {
    pub name: String,
    /// Commit date formatted as `YYYY-MM-DD`, empty when unknown.
    pub date: String,
}

/// Visibility filter for repository listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    All,
    Public,
    Private,
}

impl Visibility {
    pub fn as_str(self) -> &'static str {
        match self {
            Visibility::All => "all",
            Visibility::Public => "public",
            Visibility::Private => "private",
        }
    }

    /// Whether a repository with the given privacy passes the filter
    pub fn admits(self, private: bool) -> bool {
        match self {
            Visibility::All => true,
            Visibility::Public => !private,
            Visibility::Private => private,
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Visibility {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(Visibility::All),
            "public" => Ok(Visibility::Public),
            "private" => Ok(Visibility::Private),
            other => Err(Error::Other(format!(
                "invalid visibility: {} (expected all, public or private)",
                other
            ))),
        }
    }
}

/// A Go module repository hosted on a provider (one with a `go.mod` at its root)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostedRepository {
    pub name: String,
    /// `owner/name`, or the full namespace path on GitLab
    pub path: String,
    pub description: String,
    pub web_url: String,
    /// GitLab `internal` projects count as private
    pub private: bool,
}

/// Position of the local branch relative to its remote counterpart
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// Remote has no tracking ref for the branch
    New,
    /// Nothing to push or pull
    Synced,
    /// Local commits not on the remote
    NeedsPush,
    /// Remote commits not in the local branch (local may also be ahead)
    NeedsPull,
}

/// Synchronization snapshot of the current branch, computed fresh on every
/// query and never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchStatus {
    pub branch_name: String,
    pub remote_name: String,
    pub commits_ahead: u32,
    pub commits_behind: u32,
    pub is_new_branch: bool,
    pub needs_push: bool,
    pub needs_pull: bool,
    pub is_synced: bool,
    /// Fetching from the remote failed; counts come from possibly stale
    /// remote-tracking refs.
    pub degraded: bool,
}

impl BranchStatus {
    /// Status of a branch the remote has never seen. Every local commit is
    /// counted as ahead.
    pub fn new_branch(branch: &str, remote: &str, local_commits: u32) -> Self {
        Self {
            branch_name: branch.to_string(),
            remote_name: remote.to_string(),
            commits_ahead: local_commits,
            commits_behind: 0,
            is_new_branch: true,
            needs_push: true,
            needs_pull: false,
            is_synced: false,
            degraded: false,
        }
    }

    /// Status of a branch with an existing tracking ref.
    pub fn tracked(branch: &str, remote: &str, ahead: u32, behind: u32) -> Self {
        Self {
            branch_name: branch.to_string(),
            remote_name: remote.to_string(),
            commits_ahead: ahead,
            commits_behind: behind,
            is_new_branch: false,
            needs_push: ahead > 0,
            needs_pull: behind > 0,
            is_synced: ahead == 0 && behind == 0,
            degraded: false,
        }
    }

    pub fn with_degraded(mut self, degraded: bool) -> Self {
        self.degraded = degraded;
        self
    }

    pub fn state(&self) -> SyncState {
        if self.is_new_branch {
            SyncState::New
        } else if self.needs_pull {
            SyncState::NeedsPull
        } else if self.needs_push {
            SyncState::NeedsPush
        } else {
            SyncState::Synced
        }
    }

    /// Ref name of the remote counterpart, e.g. `origin/main`.
    pub fn tracking_ref(&self) -> String {
        format!("{}/{}", self.remote_name, self.branch_name)
    }
}
