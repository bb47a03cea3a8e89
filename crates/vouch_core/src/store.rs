//! In-memory model of the credential file plus the token sealing applied at
//! its persistence boundary.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::crypto::{self, EncryptionKey};
use crate::entities::Account;
use crate::error::Error;

/// Ordered collection of accounts, keyed by account name.
///
/// Changes are in memory only; callers persist explicitly through a
/// [`CredentialRepository`](crate::ports::CredentialRepository).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialStore {
    #[serde(default)]
    accounts: Vec<Account>,
}

impl CredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_accounts(accounts: Vec<Account>) -> Self {
        let mut store = Self::new();
        for account in accounts {
            store.add_or_replace(account);
        }
        store
    }

    /// Insert `account`, replacing an existing account with the same name
    /// in place so ordering is preserved.
    pub fn add_or_replace(&mut self, account: Account) {
        match self.accounts.iter_mut().find(|a| a.name == account.name) {
            Some(existing) => *existing = account,
            None => self.accounts.push(account),
        }
    }

    pub fn remove(&mut self, name: &str) -> Result<Account, Error> {
        let index = self
            .accounts
            .iter()
            .position(|a| a.name == name)
            .ok_or_else(|| Error::AccountNameNotFound(name.to_string()))?;
        Ok(self.accounts.remove(index))
    }

    pub fn get(&self, name: &str) -> Option<&Account> {
        self.accounts.iter().find(|a| a.name == name)
    }

    /// Pick an account by name, or the sole account when no name is given.
    pub fn select(&self, name: Option<&str>) -> Result<&Account, Error> {
        match name {
            Some(name) => self
                .get(name)
                .ok_or_else(|| Error::AccountNameNotFound(name.to_string())),
            None => match self.accounts.as_slice() {
                [] => Err(Error::NoAccounts),
                [only] => Ok(only),
                many => Err(Error::AmbiguousAccount(many.len())),
            },
        }
    }

    pub fn list(&self) -> &[Account] {
        &self.accounts
    }

    /// Remove every account, returning how many there were
    pub fn clear(&mut self) -> usize {
        let count = self.accounts.len();
        self.accounts.clear();
        count
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

/// Copy of `store` with every plaintext token encrypted. Tokens that
/// already look encrypted are copied as-is.
pub fn seal(store: &CredentialStore, key: &EncryptionKey) -> Result<CredentialStore, Error> {
    let mut sealed = store.clone();
    for account in &mut sealed.accounts {
        if !crypto::looks_encrypted(&account.token) {
            account.token = crypto::encrypt(&account.token, key)?;
        }
    }
    Ok(sealed)
}

/// Decrypt every token that looks encrypted. A token that fails to decrypt
/// is kept unchanged so a legacy plaintext store still loads.
pub fn open(mut store: CredentialStore, key: &EncryptionKey) -> CredentialStore {
    for account in &mut store.accounts {
        if !crypto::looks_encrypted(&account.token) {
            continue;
        }
        match crypto::decrypt(&account.token, key) {
            Ok(plaintext) => account.token = plaintext,
            Err(e) => warn!(
                account = %account.name,
                error = %e,
                "Keeping token that failed to decrypt"
            ),
        }
    }
    store
}
