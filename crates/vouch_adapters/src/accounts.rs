use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, instrument};
use vouch_core::key::KeyProvider;
use vouch_core::ports::{CredentialRepository, MachineIdentity, SecretStore};
use vouch_core::store::{self, CredentialStore};
use vouch_core::Error;

pub const STORE_FILE_NAME: &str = "config.json";

/// JSON credential file with tokens encrypted at rest.
///
/// Every load and save goes through one lock so concurrent callers never
/// interleave a read with a half-written file.
pub struct FileCredentialRepository<S, M>
where
    S: SecretStore,
    M: MachineIdentity,
{
    store_path: PathBuf,
    keys: Arc<KeyProvider<S, M>>,
    lock: Mutex<()>,
}

impl<S, M> FileCredentialRepository<S, M>
where
    S: SecretStore,
    M: MachineIdentity,
{
    pub fn new(config_dir: PathBuf, keys: Arc<KeyProvider<S, M>>) -> Self {
        Self::with_path(config_dir.join(STORE_FILE_NAME), keys)
    }

    pub fn with_path(store_path: PathBuf, keys: Arc<KeyProvider<S, M>>) -> Self {
        Self {
            store_path,
            keys,
            lock: Mutex::new(()),
        }
    }

    async fn read_document(&self) -> Result<Option<CredentialStore>, Error> {
        if !path_exists(&self.store_path).await? {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.store_path).await.map_err(|e| {
            Error::ConfigIo(format!("failed to read {}: {}", self.store_path.display(), e))
        })?;
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| Error::ConfigIo(format!("failed to parse credential file: {}", e)))
    }

    /// Write to an owner-only temp file beside the store, then rename it
    /// over the store.
    async fn write_document(&self, document: &CredentialStore) -> Result<(), Error> {
        if let Some(parent) = self
            .store_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
        {
            ensure_private_dir(parent).await?;
        }

        let content = serde_json::to_string_pretty(document)
            .map_err(|e| Error::ConfigIo(format!("failed to serialize credentials: {}", e)))?;

        let temp_path = self.store_path.with_extension("json.tmp");
        let write_error = |e: std::io::Error| {
            Error::ConfigIo(format!("failed to write {}: {}", temp_path.display(), e))
        };

        // A stale temp file from an interrupted save may carry other permissions
        if let Err(e) = fs::remove_file(&temp_path).await {
            if e.kind() != ErrorKind::NotFound {
                return Err(write_error(e));
            }
        }

        let mut options = fs::OpenOptions::new();
        options.write(true).create_new(true);
        #[cfg(unix)]
        options.mode(0o600);

        let mut file = options.open(&temp_path).await.map_err(write_error)?;
        file.write_all(content.as_bytes()).await.map_err(write_error)?;
        file.sync_all().await.map_err(write_error)?;
        drop(file);

        fs::rename(&temp_path, &self.store_path).await.map_err(|e| {
            Error::ConfigIo(format!("failed to replace {}: {}", self.store_path.display(), e))
        })
    }
}

#[async_trait]
impl<S, M> CredentialRepository for FileCredentialRepository<S, M>
where
    S: SecretStore,
    M: MachineIdentity,
{
    #[instrument(skip(self), fields(path = %self.store_path.display()))]
    async fn load(&self) -> Result<CredentialStore, Error> {
        let _guard = self.lock.lock().await;

        let Some(document) = self.read_document().await? else {
            debug!("no credential file yet");
            return Ok(CredentialStore::new());
        };

        let key = self.keys.obtain_key().await?;
        let store = store::open(document, &key);
        debug!(accounts = store.len(), "loaded credentials");
        Ok(store)
    }

    #[instrument(skip(self, credentials), fields(path = %self.store_path.display()))]
    async fn save(&self, credentials: &CredentialStore) -> Result<(), Error> {
        let _guard = self.lock.lock().await;

        let key = self.keys.obtain_key().await?;
        let sealed = store::seal(credentials, &key)?;
        self.write_document(&sealed).await?;
        debug!(accounts = sealed.len(), "saved credentials");
        Ok(())
    }

    fn location(&self) -> PathBuf {
        self.store_path.clone()
    }
}

/// Create `dir` if needed; a directory created here is owner-only.
async fn ensure_private_dir(dir: &Path) -> Result<(), Error> {
    if path_exists(dir).await? {
        return Ok(());
    }
    fs::create_dir_all(dir).await.map_err(|e| {
        Error::ConfigIo(format!("failed to create {}: {}", dir.display(), e))
    })?;
    restrict_permissions(dir, 0o700).await
}

/// A failed stat other than "not found" is an error, not an absent file
async fn path_exists(path: &Path) -> Result<bool, Error> {
    fs::try_exists(path)
        .await
        .map_err(|e| Error::ConfigIo(format!("failed to access {}: {}", path.display(), e)))
}

async fn restrict_permissions(path: &Path, mode: u32) -> Result<(), Error> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
            .await
            .map_err(|e| {
                Error::ConfigIo(format!(
                    "failed to set permissions on {}: {}",
                    path.display(),
                    e
                ))
            })?;
    }

    #[cfg(not(unix))]
    {
        let _ = (path, mode);
    }

    Ok(())
}
