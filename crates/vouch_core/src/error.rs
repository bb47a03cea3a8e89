use thiserror::Error;

use crate::entities::ProviderKind;

#[derive(Debug, Error)]
pub enum Error {
    // =========================================================================
    // Credential Store Errors
    // =========================================================================

    #[error("config io error: {0}")]
    ConfigIo(String),

    #[error("crypto error: {0}")]
    Crypto(String),

    #[error("no account found for {domain}/{owner}")]
    AccountNotFound { domain: String, owner: String },

    #[error("account '{0}' not found")]
    AccountNameNotFound(String),

    #[error("no accounts configured")]
    NoAccounts,

    #[error("{0} accounts configured, an account name is required")]
    AmbiguousAccount(usize),

    #[error("unsupported provider: {0} (expected 'github' or 'gitlab')")]
    UnsupportedProvider(String),

    #[error("failed to detect config directory")]
    ConfigDirectoryNotFound,

    // =========================================================================
    // Repository Errors
    // =========================================================================

    #[error("not a git repository: {0}")]
    NotAGitRepository(String),

    #[error("remote query failed: {0}")]
    RemoteQuery(String),

    #[error("invalid version format: {0} (expected vX.Y.Z)")]
    InvalidVersion(String),

    #[error("uncommitted changes in working tree")]
    UncommittedChanges,

    #[error("branch '{branch}' is {behind} commit(s) behind {remote}")]
    BranchBehind {
        branch: String,
        remote: String,
        behind: u32,
    },

    // =========================================================================
    // Provider API Errors
    // =========================================================================

    #[error("{provider} api error: {message}")]
    Provider {
        provider: ProviderKind,
        message: String,
    },

    #[error("network error: {0}")]
    Network(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Account lookup failed: missing, empty store, or no unique default
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::AccountNotFound { .. }
                | Error::AccountNameNotFound(_)
                | Error::NoAccounts
                | Error::AmbiguousAccount(_)
        )
    }
}
