use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use tracing::{debug, instrument, warn};
use vouch_core::entities::{
    normalize_domain, HostedRepository, ProviderKind, VersionTag, Visibility,
};
use vouch_core::ports::VersionControlProvider;
use vouch_core::Error;

use crate::network::{decode_json, expect_status, transport_error, PER_PAGE};

const PUBLIC_API_URL: &str = "https://api.github.com";
const ACCEPT: &str = "application/vnd.github+json";
const KIND: ProviderKind = ProviderKind::GitHub;

#[derive(Deserialize)]
struct User {
    login: String,
}

#[derive(Deserialize)]
struct CommitRef {
    sha: String,
}

#[derive(Deserialize)]
struct Tag {
    name: String,
    commit: CommitRef,
}

#[derive(Deserialize)]
struct Repository {
    default_branch: String,
}

#[derive(Deserialize)]
struct Branch {
    commit: CommitRef,
}

#[derive(Deserialize)]
struct Repo {
    name: String,
    full_name: String,
    #[serde(default)]
    description: Option<String>,
    html_url: String,
    #[serde(default)]
    private: bool,
}

#[derive(Deserialize)]
struct CommitAuthor {
    date: String,
}

#[derive(Deserialize)]
struct CommitDetail {
    author: CommitAuthor,
}

#[derive(Deserialize)]
struct Commit {
    commit: CommitDetail,
}

/// API endpoint for a GitHub web URL: the public API for github.com,
/// `<url>/api/v3` for Enterprise Server instances.
pub fn api_url_for(base_url: &str) -> String {
    let domain = normalize_domain(base_url);
    if domain.is_empty() || domain == "github.com" {
        return PUBLIC_API_URL.to_string();
    }

    let base = base_url.trim().trim_end_matches('/');
    if base.starts_with("http://") || base.starts_with("https://") {
        format!("{}/api/v3", base)
    } else {
        format!("https://{}/api/v3", base)
    }
}

/// GitHub REST API client bound to one token
pub struct GitHubProvider {
    client: Client,
    api_url: String,
    token: String,
}

impl GitHubProvider {
    pub fn new(client: Client, base_url: &str, token: impl Into<String>) -> Self {
        Self::with_api_url(client, api_url_for(base_url), token)
    }

    pub fn with_api_url(
        client: Client,
        api_url: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    fn get(&self, path: &str) -> RequestBuilder {
        self.authorized(self.client.get(format!("{}{}", self.api_url, path)))
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.bearer_auth(&self.token).header("Accept", ACCEPT)
    }

    async fn default_branch_sha(&self, repo_path: &str) -> Result<String, Error> {
        let response = self
            .get(&format!("/repos/{}", repo_path))
            .send()
            .await
            .map_err(transport_error)?;
        let response = expect_status(KIND, response, StatusCode::OK, "get repository").await?;
        let repository: Repository = decode_json(KIND, response).await?;

        let response = self
            .get(&format!("/repos/{}/branches/{}", repo_path, repository.default_branch))
            .send()
            .await
            .map_err(transport_error)?;
        let response = expect_status(KIND, response, StatusCode::OK, "get branch").await?;
        let branch: Branch = decode_json(KIND, response).await?;

        debug!(
            branch = %repository.default_branch,
            sha = %branch.commit.sha,
            "resolved default branch"
        );
        Ok(branch.commit.sha)
    }

    async fn get_commit(&self, repo_path: &str, sha: &str) -> Result<Commit, Error> {
        let response = self
            .get(&format!("/repos/{}/commits/{}", repo_path, sha))
            .send()
            .await
            .map_err(transport_error)?;
        let response = expect_status(KIND, response, StatusCode::OK, "get commit").await?;
        decode_json(KIND, response).await
    }

    /// One page of a repository listing. `filter` is the query parameter
    /// narrowing by visibility, where the endpoint supports one.
    async fn repositories_page(
        &self,
        endpoint: &str,
        filter: Option<&str>,
        visibility: Visibility,
        page: usize,
    ) -> Result<Response, Error> {
        let mut request = self
            .get(endpoint)
            .query(&[("per_page", PER_PAGE), ("page", page)]);
        if let (Some(param), Visibility::Public | Visibility::Private) = (filter, visibility) {
            request = request.query(&[(param, visibility.as_str())]);
        }
        request.send().await.map_err(transport_error)
    }

    async fn has_go_mod(&self, full_name: &str) -> bool {
        let url = format!("{}/repos/{}/contents/go.mod", self.api_url, full_name);
        match self.authorized(self.client.head(url)).send().await {
            Ok(response) => response.status() == StatusCode::OK,
            Err(e) => {
                debug!(repo = full_name, error = %e, "go.mod check failed");
                false
            }
        }
    }

    /// Commit date as `YYYY-MM-DD`, empty when it cannot be fetched
    async fn commit_date(&self, repo_path: &str, sha: &str) -> String {
        match self.get_commit(repo_path, sha).await {
            Ok(commit) => commit.commit.author.date.chars().take(10).collect(),
            Err(e) => {
                warn!(sha, error = %e, "could not fetch commit date");
                String::new()
            }
        }
    }
}

#[async_trait]
impl VersionControlProvider for GitHubProvider {
    fn api_url(&self) -> &str {
        &self.api_url
    }

    #[instrument(skip(self), fields(api = %self.api_url))]
    async fn validate_token(&self) -> Result<String, Error> {
        let response = self.get("/user").send().await.map_err(transport_error)?;
        let response = expect_status(KIND, response, StatusCode::OK, "validate token").await?;
        let user: User = decode_json(KIND, response).await?;
        Ok(user.login)
    }

    #[instrument(skip(self), fields(api = %self.api_url))]
    async fn list_repositories(
        &self,
        owner: Option<&str>,
        visibility: Visibility,
    ) -> Result<Vec<HostedRepository>, Error> {
        let (mut endpoint, mut filter) = match owner {
            Some(owner) => (format!("/orgs/{}/repos", owner), Some("type")),
            None => ("/user/repos".to_string(), Some("visibility")),
        };

        let mut repositories = Vec::new();
        let mut page = 1;
        loop {
            let mut response = self
                .repositories_page(&endpoint, filter, visibility, page)
                .await?;

            if let (Some(owner), StatusCode::NOT_FOUND) = (owner, response.status()) {
                if page == 1 {
                    debug!(owner, "not an organization, listing user repositories");
                    // The user endpoint has no visibility filter
                    endpoint = format!("/users/{}/repos", owner);
                    filter = None;
                    response = self
                        .repositories_page(&endpoint, filter, visibility, page)
                        .await?;
                }
            }

            let response =
                expect_status(KIND, response, StatusCode::OK, "list repositories").await?;
            let batch: Vec<Repo> = decode_json(KIND, response).await?;
            let last_page = batch.len() < PER_PAGE;

            for repo in batch {
                if !visibility.admits(repo.private) || !self.has_go_mod(&repo.full_name).await {
                    continue;
                }
                repositories.push(HostedRepository {
                    name: repo.name,
                    path: repo.full_name,
                    description: repo.description.unwrap_or_default(),
                    web_url: repo.html_url,
                    private: repo.private,
                });
            }

            if last_page {
                break;
            }
            page += 1;
        }

        Ok(repositories)
    }

    #[instrument(skip(self), fields(api = %self.api_url))]
    async fn list_versions(&self, repo_path: &str) -> Result<Vec<VersionTag>, Error> {
        let response = self
            .get(&format!("/repos/{}/tags", repo_path))
            .send()
            .await
            .map_err(transport_error)?;
        let response = expect_status(KIND, response, StatusCode::OK, "list tags").await?;
        let tags: Vec<Tag> = decode_json(KIND, response).await?;

        let mut versions = Vec::with_capacity(tags.len());
        for tag in tags {
            let date = self.commit_date(repo_path, &tag.commit.sha).await;
            versions.push(VersionTag {
                name: tag.name,
                date,
            });
        }
        Ok(versions)
    }

    #[instrument(skip(self), fields(api = %self.api_url))]
    async fn create_tag(&self, repo_path: &str, tag: &str) -> Result<(), Error> {
        let sha = self.default_branch_sha(repo_path).await?;

        let payload = serde_json::json!({
            "ref": format!("refs/tags/{}", tag),
            "sha": sha,
        });
        let response = self
            .authorized(
                self.client
                    .post(format!("{}/repos/{}/git/refs", self.api_url, repo_path)),
            )
            .json(&payload)
            .send()
            .await
            .map_err(transport_error)?;
        expect_status(KIND, response, StatusCode::CREATED, "create tag").await?;
        Ok(())
    }
}
