use async_trait::async_trait;
use keyring::Entry;
use tracing::{debug, instrument};
use vouch_core::config::DEFAULT_KEYRING_SERVICE;
use vouch_core::ports::SecretStore;
use vouch_core::Error;

/// Secret store backed by the OS keyring (Secret Service on Linux, Keychain on
/// macOS, Credential Manager on Windows). Entries must outlive a reboot: a
/// lost key leaves every stored token undecryptable.
pub struct KeyringSecretStore {
    service: String,
}

impl KeyringSecretStore {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn get_entry(&self, name: &str) -> Result<Entry, Error> {
        Entry::new(&self.service, name)
            .map_err(|e| Error::Crypto(format!("failed to create keyring entry: {}", e)))
    }
}

impl Default for KeyringSecretStore {
    fn default() -> Self {
        Self::new(DEFAULT_KEYRING_SERVICE)
    }
}

#[async_trait]
impl SecretStore for KeyringSecretStore {
    #[instrument(skip(self), fields(service = %self.service))]
    async fn get_secret(&self, name: &str) -> Result<Option<String>, Error> {
        let entry = self.get_entry(name)?;

        // Keyring backends block on D-Bus/IPC
        tokio::task::spawn_blocking(move || match entry.get_password() {
            Ok(secret) => Ok(Some(secret)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(Error::Crypto(format!("failed to read secret: {}", e))),
        })
        .await
        .map_err(|e| Error::Other(format!("task join error: {}", e)))?
    }

    #[instrument(skip(self, value), fields(service = %self.service))]
    async fn set_secret(&self, name: &str, value: &str) -> Result<(), Error> {
        let entry = self.get_entry(name)?;
        let value = value.to_string();

        debug!("storing secret in keyring");

        tokio::task::spawn_blocking(move || {
            entry
                .set_password(&value)
                .map_err(|e| Error::Crypto(format!("failed to store secret: {}", e)))
        })
        .await
        .map_err(|e| Error::Other(format!("task join error: {}", e)))?
    }
}
