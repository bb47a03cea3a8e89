//! In-memory implementations of the ports for use-case tests.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::entities::{HostedRepository, ProviderKind, VersionTag, Visibility};
use crate::error::Error;
use crate::ports::{
    CredentialRepository, MachineIdentity, ProviderFactory, RemoteStatus, SecretStore,
    VersionControlProvider,
};
use crate::store::CredentialStore;

// ============================================================================
// Secrets
// ============================================================================

#[derive(Default)]
pub struct MemorySecretStore {
    secrets: Mutex<HashMap<String, String>>,
    unavailable: bool,
    reads: Mutex<usize>,
}

impl MemorySecretStore {
    pub fn with_secret(name: &str, value: &str) -> Self {
        let store = Self::default();
        store
            .secrets
            .lock()
            .unwrap()
            .insert(name.to_string(), value.to_string());
        store
    }

    /// A store whose backend is missing: reads fail and writes fail
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    pub fn get(&self, name: &str) -> Option<String> {
        self.secrets.lock().unwrap().get(name).cloned()
    }

    pub fn clear(&self) {
        self.secrets.lock().unwrap().clear();
    }

    pub fn reads(&self) -> usize {
        *self.reads.lock().unwrap()
    }
}

#[async_trait]
impl SecretStore for MemorySecretStore {
    async fn get_secret(&self, name: &str) -> Result<Option<String>, Error> {
        *self.reads.lock().unwrap() += 1;
        if self.unavailable {
            return Err(Error::Other("no secret service".into()));
        }
        Ok(self.get(name))
    }

    async fn set_secret(&self, name: &str, value: &str) -> Result<(), Error> {
        if self.unavailable {
            return Err(Error::Other("no secret service".into()));
        }
        self.secrets
            .lock()
            .unwrap()
            .insert(name.to_string(), value.to_string());
        Ok(())
    }
}

pub struct FakeMachine {
    machine_id: String,
    username: String,
}

impl FakeMachine {
    pub fn new(machine_id: &str, username: &str) -> Self {
        Self {
            machine_id: machine_id.to_string(),
            username: username.to_string(),
        }
    }
}

impl MachineIdentity for FakeMachine {
    fn machine_id(&self) -> String {
        self.machine_id.clone()
    }

    fn username(&self) -> String {
        self.username.clone()
    }
}

// ============================================================================
// Credential repository
// ============================================================================

#[derive(Default)]
pub struct MemoryCredentialRepository {
    store: Mutex<CredentialStore>,
    saves: Mutex<usize>,
}

impl MemoryCredentialRepository {
    pub fn with_store(store: CredentialStore) -> Self {
        Self {
            store: Mutex::new(store),
            saves: Mutex::new(0),
        }
    }

    pub fn snapshot(&self) -> CredentialStore {
        self.store.lock().unwrap().clone()
    }

    pub fn saves(&self) -> usize {
        *self.saves.lock().unwrap()
    }
}

#[async_trait]
impl CredentialRepository for MemoryCredentialRepository {
    async fn load(&self) -> Result<CredentialStore, Error> {
        Ok(self.snapshot())
    }

    async fn save(&self, store: &CredentialStore) -> Result<(), Error> {
        *self.store.lock().unwrap() = store.clone();
        *self.saves.lock().unwrap() += 1;
        Ok(())
    }

    fn location(&self) -> PathBuf {
        PathBuf::from("memory")
    }
}

// ============================================================================
// Local repository
// ============================================================================

/// Scripted working tree. `tracking` is `None` when the remote has no
/// branch of the same name, otherwise `(ahead, behind)`.
pub struct FakeRemote {
    pub root: Option<PathBuf>,
    pub dirty: bool,
    pub url: String,
    pub branch: String,
    pub fetch_fails: bool,
    pub tracking: Option<(u32, u32)>,
    pub total: u32,
    pub pushes: Mutex<Vec<String>>,
}

impl Default for FakeRemote {
    fn default() -> Self {
        Self {
            root: Some(PathBuf::from("/work/widgets")),
            dirty: false,
            url: "git@github.com:acme/widgets.git".to_string(),
            branch: "main".to_string(),
            fetch_fails: false,
            tracking: Some((0, 0)),
            total: 5,
            pushes: Mutex::new(Vec::new()),
        }
    }
}

impl FakeRemote {
    pub fn pushes(&self) -> Vec<String> {
        self.pushes.lock().unwrap().clone()
    }

    fn require_repo(&self) -> Result<(), Error> {
        match self.root {
            Some(_) => Ok(()),
            None => Err(Error::NotAGitRepository("fatal: not a git repository".into())),
        }
    }
}

#[async_trait]
impl RemoteStatus for FakeRemote {
    async fn repo_root(&self) -> Result<PathBuf, Error> {
        self.root
            .clone()
            .ok_or_else(|| Error::NotAGitRepository("fatal: not a git repository".into()))
    }

    async fn has_uncommitted_changes(&self) -> Result<bool, Error> {
        self.require_repo()?;
        Ok(self.dirty)
    }

    async fn remote_url(&self, _remote: &str) -> Result<String, Error> {
        self.require_repo()?;
        Ok(self.url.clone())
    }

    async fn current_branch(&self) -> Result<String, Error> {
        self.require_repo()?;
        Ok(self.branch.clone())
    }

    async fn fetch(&self, remote: &str) -> Result<(), Error> {
        if self.fetch_fails {
            return Err(Error::RemoteQuery(format!("could not read from {}", remote)));
        }
        Ok(())
    }

    async fn has_remote_branch(&self, _tracking_ref: &str) -> Result<bool, Error> {
        Ok(self.tracking.is_some())
    }

    async fn count_commits(&self, range: &str) -> Result<u32, Error> {
        let (ahead, behind) = self
            .tracking
            .ok_or_else(|| Error::RemoteQuery(format!("unknown revision {}", range)))?;
        if range.ends_with("..HEAD") {
            Ok(ahead)
        } else {
            Ok(behind)
        }
    }

    async fn total_commits(&self) -> Result<u32, Error> {
        Ok(self.total)
    }

    async fn push(&self, remote: &str, branch: &str) -> Result<(), Error> {
        self.pushes
            .lock()
            .unwrap()
            .push(format!("push {} {}", remote, branch));
        Ok(())
    }

    async fn push_set_upstream(&self, remote: &str, branch: &str) -> Result<(), Error> {
        self.pushes
            .lock()
            .unwrap()
            .push(format!("push -u {} {}", remote, branch));
        Ok(())
    }
}

// ============================================================================
// Providers
// ============================================================================

/// Shared state behind every provider a [`FakeProviderFactory`] hands out
#[derive(Default)]
pub struct ProviderState {
    pub username: Option<String>,
    pub tags: Vec<VersionTag>,
    pub repositories: Vec<HostedRepository>,
    pub created: Mutex<Vec<(String, String)>>,
    pub built: Mutex<Vec<(ProviderKind, String, String)>>,
}

#[derive(Default, Clone)]
pub struct FakeProviderFactory {
    pub state: Arc<ProviderState>,
}

impl FakeProviderFactory {
    pub fn with_user(username: &str) -> Self {
        Self {
            state: Arc::new(ProviderState {
                username: Some(username.to_string()),
                ..ProviderState::default()
            }),
        }
    }

    pub fn created(&self) -> Vec<(String, String)> {
        self.state.created.lock().unwrap().clone()
    }

    pub fn built(&self) -> Vec<(ProviderKind, String, String)> {
        self.state.built.lock().unwrap().clone()
    }
}

impl ProviderFactory for FakeProviderFactory {
    fn create(
        &self,
        kind: ProviderKind,
        url: &str,
        token: &str,
    ) -> Result<Box<dyn VersionControlProvider>, Error> {
        self.state
            .built
            .lock()
            .unwrap()
            .push((kind, url.to_string(), token.to_string()));
        let api_url = match kind {
            ProviderKind::GitHub => "https://api.github.com".to_string(),
            ProviderKind::GitLab => format!("{}/api/v4", url.trim_end_matches('/')),
        };
        Ok(Box::new(FakeProvider {
            kind,
            api_url,
            state: self.state.clone(),
        }))
    }
}

pub struct FakeProvider {
    kind: ProviderKind,
    api_url: String,
    state: Arc<ProviderState>,
}

#[async_trait]
impl VersionControlProvider for FakeProvider {
    fn api_url(&self) -> &str {
        &self.api_url
    }

    async fn validate_token(&self) -> Result<String, Error> {
        self.state.username.clone().ok_or(Error::Provider {
            provider: self.kind,
            message: "status 401 Unauthorized".into(),
        })
    }

    async fn list_repositories(
        &self,
        _owner: Option<&str>,
        visibility: Visibility,
    ) -> Result<Vec<HostedRepository>, Error> {
        Ok(self
            .state
            .repositories
            .iter()
            .filter(|r| visibility.admits(r.private))
            .cloned()
            .collect())
    }

    async fn list_versions(&self, _repo_path: &str) -> Result<Vec<VersionTag>, Error> {
        Ok(self.state.tags.clone())
    }

    async fn create_tag(&self, repo_path: &str, tag: &str) -> Result<(), Error> {
        self.state
            .created
            .lock()
            .unwrap()
            .push((repo_path.to_string(), tag.to_string()));
        Ok(())
    }
}
