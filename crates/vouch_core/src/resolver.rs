//! Selection of the account that applies to a repository.

use crate::entities::{normalize_domain, Account};
use crate::error::Error;
use crate::remote::ModuleRef;
use crate::store::CredentialStore;

/// Select the account for `owner` on `domain`.
///
/// Accounts are scanned in store order. The first one listing `owner` wins;
/// otherwise the first wildcard account on the domain is used.
pub fn resolve_for_owner<'a>(
    store: &'a CredentialStore,
    domain: &str,
    owner: &str,
) -> Result<&'a Account, Error> {
    let target = normalize_domain(domain);
    let mut wildcard = None;

    for account in store.list().iter().filter(|a| a.matches_domain(&target)) {
        if account.has_owner(owner) {
            return Ok(account);
        }
        if wildcard.is_none() && account.is_wildcard() {
            wildcard = Some(account);
        }
    }

    wildcard.ok_or_else(|| Error::AccountNotFound {
        domain: target,
        owner: owner.to_string(),
    })
}

/// First account on `domain`, regardless of owners.
pub fn resolve_for_domain<'a>(
    store: &'a CredentialStore,
    domain: &str,
) -> Result<&'a Account, Error> {
    let target = normalize_domain(domain);
    store
        .list()
        .iter()
        .find(|a| a.matches_domain(&target))
        .ok_or(Error::AccountNotFound {
            domain: target,
            owner: String::new(),
        })
}

/// Resolve the account for a module path such as `github.com/acme/lib`.
pub fn resolve_for_module<'a>(
    store: &'a CredentialStore,
    module: &str,
) -> Result<&'a Account, Error> {
    let module = ModuleRef::parse(module)?;
    resolve_for_owner(store, &module.domain, &module.owner)
}
