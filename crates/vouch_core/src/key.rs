//! Acquisition of the symmetric key used by the token cipher.

use std::sync::Arc;

use sha2::{Digest, Sha256};
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use crate::crypto::EncryptionKey;
use crate::error::Error;
use crate::ports::{MachineIdentity, SecretStore};

/// Name of the secret holding the base64 key inside the secret store service
pub const KEY_SECRET_NAME: &str = "encryption-key";

const FALLBACK_KEY_SALT: &str = "vouch-cli-v1";

/// Deterministic key for machines without a usable secret store:
/// `sha256("{machine_id}:{user}:vouch-cli-v1")`.
pub fn derive_fallback_key(machine_id: &str, user: &str) -> EncryptionKey {
    let mut hasher = Sha256::new();
    hasher.update(format!("{}:{}:{}", machine_id, user, FALLBACK_KEY_SALT).as_bytes());
    EncryptionKey::from_bytes(hasher.finalize().into())
}

/// Resolves the encryption key once and caches it for the lifetime of the
/// provider value.
pub struct KeyProvider<S, M>
where
    S: SecretStore,
    M: MachineIdentity,
{
    secret_store: Arc<S>,
    machine: Arc<M>,
    cached: OnceCell<EncryptionKey>,
}

impl<S, M> KeyProvider<S, M>
where
    S: SecretStore,
    M: MachineIdentity,
{
    pub fn new(secret_store: Arc<S>, machine: Arc<M>) -> Self {
        Self {
            secret_store,
            machine,
            cached: OnceCell::new(),
        }
    }

    /// Return the key, resolving it on first use.
    ///
    /// A stored key wins. Without one, a fresh random key is generated and
    /// persisted; if it cannot be persisted the deterministic fallback key
    /// is used instead so tokens stay readable on the next run.
    pub async fn obtain_key(&self) -> Result<EncryptionKey, Error> {
        self.cached
            .get_or_try_init(|| self.resolve())
            .await
            .cloned()
    }

    async fn resolve(&self) -> Result<EncryptionKey, Error> {
        match self.secret_store.get_secret(KEY_SECRET_NAME).await {
            Ok(Some(encoded)) => {
                debug!("Using encryption key from secret store");
                return EncryptionKey::from_base64(&encoded);
            }
            Ok(None) => debug!("No encryption key stored yet"),
            Err(e) => warn!(error = %e, "Secret store unavailable"),
        }

        let key = EncryptionKey::generate();
        match self
            .secret_store
            .set_secret(KEY_SECRET_NAME, &key.to_base64())
            .await
        {
            Ok(()) => {
                debug!("Stored new encryption key in secret store");
                Ok(key)
            }
            Err(e) => {
                warn!(error = %e, "Could not persist encryption key, using machine-derived key");
                Ok(derive_fallback_key(
                    &self.machine.machine_id(),
                    &self.machine.username(),
                ))
            }
        }
    }
}
