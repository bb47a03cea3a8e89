use std::sync::Arc;

use tracing::info;

use crate::entities::{normalize_domain, Account, ProviderKind};
use crate::error::Error;
use crate::ports::{CredentialRepository, ProviderFactory};

/// Input of a login: which instance to talk to and with which token.
#[derive(Clone)]
pub struct LoginRequest {
    pub provider: ProviderKind,
    /// Web URL of the instance, e.g. `https://gitlab.example.com`
    pub url: String,
    pub token: String,
    /// Account name; defaults to `{provider}-{username}`
    pub name: Option<String>,
    pub owners: Vec<String>,
}

/// Registers, replaces and removes accounts in the credential store.
pub struct LoginUseCase<C, F>
where
    C: CredentialRepository,
    F: ProviderFactory,
{
    credentials: Arc<C>,
    providers: Arc<F>,
}

impl<C, F> LoginUseCase<C, F>
where
    C: CredentialRepository,
    F: ProviderFactory,
{
    pub fn new(credentials: Arc<C>, providers: Arc<F>) -> Self {
        Self {
            credentials,
            providers,
        }
    }

    /// Validate the token against the provider and store the account.
    ///
    /// An existing account with the same name is replaced in place.
    pub async fn execute(&self, request: LoginRequest) -> Result<Account, Error> {
        let provider = self
            .providers
            .create(request.provider, &request.url, &request.token)?;
        let username = provider.validate_token().await?;

        let name = request
            .name
            .filter(|n| !n.trim().is_empty())
            .map(|n| n.trim().to_string())
            .unwrap_or_else(|| format!("{}-{}", request.provider, username));

        let account = Account::new(
            name,
            request.provider,
            provider.api_url(),
            normalize_domain(&request.url),
            request.token,
        )
        .with_owners(normalize_owners(&request.owners));

        let mut store = self.credentials.load().await?;
        store.add_or_replace(account.clone());
        self.credentials.save(&store).await?;

        info!(account = %account.name, user = %username, domain = %account.domain, "Account saved");
        Ok(account)
    }

    /// Remove one account by name
    pub async fn logout(&self, name: &str) -> Result<Account, Error> {
        let mut store = self.credentials.load().await?;
        let removed = store.remove(name)?;
        self.credentials.save(&store).await?;
        info!(account = %name, "Account removed");
        Ok(removed)
    }

    /// Remove every account, returning how many were removed
    pub async fn logout_all(&self) -> Result<usize, Error> {
        let mut store = self.credentials.load().await?;
        let count = store.clear();
        self.credentials.save(&store).await?;
        info!(count, "All accounts removed");
        Ok(count)
    }
}

/// Trim, drop empties and de-duplicate while keeping first-seen order.
pub fn normalize_owners<S: AsRef<str>>(owners: &[S]) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::new();
    for owner in owners.iter().flat_map(|o| o.as_ref().split(',')) {
        let owner = owner.trim();
        if !owner.is_empty() && !normalized.iter().any(|o| o == owner) {
            normalized.push(owner.to_string());
        }
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::CredentialStore;
    use crate::test_support::{FakeProviderFactory, MemoryCredentialRepository};
    use rstest::rstest;

    fn request(provider: ProviderKind, url: &str) -> LoginRequest {
        LoginRequest {
            provider,
            url: url.to_string(),
            token: "glpat-token".to_string(),
            name: None,
            owners: Vec::new(),
        }
    }

    fn use_case(
        repo: MemoryCredentialRepository,
        factory: FakeProviderFactory,
    ) -> (
        Arc<MemoryCredentialRepository>,
        LoginUseCase<MemoryCredentialRepository, FakeProviderFactory>,
    ) {
        let repo = Arc::new(repo);
        (repo.clone(), LoginUseCase::new(repo, Arc::new(factory)))
    }

    #[rstest]
    #[case(&["acme", " acme-labs ", "", "acme"], &["acme", "acme-labs"])]
    #[case(&["a,b", "b , c"], &["a", "b", "c"])]
    #[case(&[" , "], &[])]
    fn test_normalize_owners(#[case] input: &[&str], #[case] expected: &[&str]) {
        assert_eq!(normalize_owners(input), expected);
    }

    #[tokio::test]
    async fn test_login_derives_name_and_domain() {
        let factory = FakeProviderFactory::with_user("octo");
        let (repo, login) = use_case(MemoryCredentialRepository::default(), factory.clone());

        let mut req = request(ProviderKind::GitLab, "https://gitlab.example.com/");
        req.owners = vec!["platform, infra".to_string()];
        let account = login.execute(req).await.unwrap();

        assert_eq!(account.name, "gitlab-octo");
        assert_eq!(account.domain, "gitlab.example.com");
        assert_eq!(account.api_url, "https://gitlab.example.com/api/v4");
        assert_eq!(account.owners, ["platform", "infra"]);
        assert_eq!(repo.snapshot().list(), [account]);
        assert_eq!(repo.saves(), 1);
        assert_eq!(
            factory.built(),
            [(
                ProviderKind::GitLab,
                "https://gitlab.example.com/".to_string(),
                "glpat-token".to_string()
            )]
        );
    }

    #[tokio::test]
    async fn test_login_replaces_account_with_same_name() {
        let existing = Account::new("work", ProviderKind::GitHub, "x", "github.com", "old");
        let other = Account::new("other", ProviderKind::GitHub, "x", "github.com", "t");
        let (repo, login) = use_case(
            MemoryCredentialRepository::with_store(CredentialStore::from_accounts(vec![
                existing, other,
            ])),
            FakeProviderFactory::with_user("octo"),
        );

        let mut req = request(ProviderKind::GitHub, "https://github.com");
        req.name = Some("work".to_string());
        req.token = "ghp_new".to_string();
        login.execute(req).await.unwrap();

        let store = repo.snapshot();
        assert_eq!(store.len(), 2);
        assert_eq!(store.list()[0].name, "work");
        assert_eq!(store.list()[0].token, "ghp_new");
    }

    #[tokio::test]
    async fn test_login_with_invalid_token_saves_nothing() {
        let (repo, login) = use_case(
            MemoryCredentialRepository::default(),
            FakeProviderFactory::default(),
        );

        let result = login
            .execute(request(ProviderKind::GitHub, "https://github.com"))
            .await;

        assert!(matches!(result, Err(Error::Provider { .. })));
        assert_eq!(repo.saves(), 0);
    }

    #[tokio::test]
    async fn test_logout_and_logout_all() {
        let accounts = ["a", "b", "c"]
            .iter()
            .map(|n| Account::new(*n, ProviderKind::GitHub, "x", "github.com", "t"))
            .collect();
        let (repo, login) = use_case(
            MemoryCredentialRepository::with_store(CredentialStore::from_accounts(accounts)),
            FakeProviderFactory::default(),
        );

        assert_eq!(login.logout("b").await.unwrap().name, "b");
        assert!(matches!(
            login.logout("b").await,
            Err(Error::AccountNameNotFound(_))
        ));
        assert_eq!(login.logout_all().await.unwrap(), 2);
        assert!(repo.snapshot().is_empty());
    }
}
