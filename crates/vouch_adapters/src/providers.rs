use std::time::Duration;

use reqwest::Client;
use vouch_core::entities::ProviderKind;
use vouch_core::ports::{ProviderFactory, VersionControlProvider};
use vouch_core::Error;

use crate::github::GitHubProvider;
use crate::gitlab::GitLabProvider;
use crate::network::build_api_client;

/// Builds GitHub/GitLab clients sharing one HTTP connection pool
pub struct HttpProviderFactory {
    client: Client,
}

impl HttpProviderFactory {
    pub fn new(timeout: Duration) -> Result<Self, Error> {
        Ok(Self {
            client: build_api_client(timeout)?,
        })
    }
}

impl ProviderFactory for HttpProviderFactory {
    fn create(
        &self,
        kind: ProviderKind,
        url: &str,
        token: &str,
    ) -> Result<Box<dyn VersionControlProvider>, Error> {
        let provider: Box<dyn VersionControlProvider> = match kind {
            ProviderKind::GitHub => Box::new(GitHubProvider::new(self.client.clone(), url, token)),
            ProviderKind::GitLab => Box::new(GitLabProvider::new(self.client.clone(), url, token)),
        };
        Ok(provider)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::DEFAULT_TIMEOUT;
    use rstest::rstest;

    #[rstest]
    #[case(ProviderKind::GitHub, "https://github.com", "https://api.github.com")]
    #[case(ProviderKind::GitHub, "https://ghe.acme.corp", "https://ghe.acme.corp/api/v3")]
    #[case(ProviderKind::GitLab, "https://gitlab.com/", "https://gitlab.com/api/v4")]
    fn test_factory_picks_client_by_kind(
        #[case] kind: ProviderKind,
        #[case] url: &str,
        #[case] api_url: &str,
    ) {
        let factory = HttpProviderFactory::new(DEFAULT_TIMEOUT).unwrap();
        let provider = factory.create(kind, url, "token").unwrap();
        assert_eq!(provider.api_url(), api_url);
    }
}
