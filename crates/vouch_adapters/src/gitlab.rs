use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use tracing::{debug, instrument};
use vouch_core::entities::{HostedRepository, ProviderKind, VersionTag, Visibility};
use vouch_core::ports::VersionControlProvider;
use vouch_core::Error;

use crate::network::{decode_json, expect_status, transport_error, PER_PAGE};

const TOKEN_HEADER: &str = "PRIVATE-TOKEN";
const KIND: ProviderKind = ProviderKind::GitLab;

#[derive(Deserialize)]
struct User {
    username: String,
}

#[derive(Deserialize)]
struct TagCommit {
    #[serde(default)]
    created_at: Option<String>,
}

#[derive(Deserialize)]
struct Tag {
    name: String,
    commit: TagCommit,
}

#[derive(Deserialize)]
struct Project {
    default_branch: String,
}

#[derive(Deserialize)]
struct ProjectSummary {
    id: u64,
    name: String,
    path_with_namespace: String,
    #[serde(default)]
    description: Option<String>,
    web_url: String,
    /// `public`, `internal` or `private`
    #[serde(default)]
    visibility: String,
    /// Absent for empty repositories
    #[serde(default)]
    default_branch: Option<String>,
}

/// API endpoint for a GitLab web URL (`<url>/api/v4`)
pub fn api_url_for(base_url: &str) -> String {
    let base = base_url.trim().trim_end_matches('/');
    if base.starts_with("http://") || base.starts_with("https://") {
        format!("{}/api/v4", base)
    } else {
        format!("https://{}/api/v4", base)
    }
}

/// Percent-encode a project path so `group/sub/name` fits in one URL
/// segment (`group%2Fsub%2Fname`).
pub fn encode_project(path: &str) -> String {
    let mut encoded = String::with_capacity(path.len());
    for byte in path.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                encoded.push(byte as char)
            }
            _ => encoded.push_str(&format!("%{:02X}", byte)),
        }
    }
    encoded
}

/// GitLab REST API (v4) client bound to one token
pub struct GitLabProvider {
    client: Client,
    api_url: String,
    token: String,
}

impl GitLabProvider {
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

    fn project_url(&self, repo_path: &str, suffix: &str) -> String {
        format!("{}/projects/{}{}", self.api_url, encode_project(repo_path), suffix)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.header(TOKEN_HEADER, &self.token)
    }

    async fn projects_page(
        &self,
        endpoint: &str,
        visibility: Visibility,
        page: usize,
    ) -> Result<Response, Error> {
        let mut request = self
            .authorized(self.client.get(format!("{}{}", self.api_url, endpoint)))
            .query(&[("per_page", PER_PAGE), ("page", page)]);
        if visibility != Visibility::All {
            request = request.query(&[("visibility", visibility.as_str())]);
        }
        request.send().await.map_err(transport_error)
    }

    async fn has_go_mod(&self, project: &ProjectSummary) -> bool {
        let Some(branch) = project.default_branch.as_deref() else {
            return false;
        };
        let url = format!(
            "{}/projects/{}/repository/files/go.mod",
            self.api_url, project.id
        );
        let request = self.authorized(self.client.head(url)).query(&[("ref", branch)]);
        match request.send().await {
            Ok(response) => response.status() == StatusCode::OK,
            Err(e) => {
                debug!(project = %project.path_with_namespace, error = %e, "go.mod check failed");
                false
            }
        }
    }

    async fn default_branch(&self, repo_path: &str) -> Result<String, Error> {
        let response = self
            .authorized(self.client.get(self.project_url(repo_path, "")))
            .send()
            .await
            .map_err(transport_error)?;
        let response = expect_status(KIND, response, StatusCode::OK, "get project").await?;
        let project: Project = decode_json(KIND, response).await?;
        Ok(project.default_branch)
    }
}

#[async_trait]
impl VersionControlProvider for GitLabProvider {
    fn api_url(&self) -> &str {
        &self.api_url
    }

    #[instrument(skip(self), fields(api = %self.api_url))]
    async fn validate_token(&self) -> Result<String, Error> {
        let response = self
            .authorized(self.client.get(format!("{}/user", self.api_url)))
            .send()
            .await
            .map_err(transport_error)?;
        let response = expect_status(KIND, response, StatusCode::OK, "validate token").await?;
        let user: User = decode_json(KIND, response).await?;
        Ok(user.username)
    }

    #[instrument(skip(self), fields(api = %self.api_url))]
    async fn list_repositories(
        &self,
        owner: Option<&str>,
        visibility: Visibility,
    ) -> Result<Vec<HostedRepository>, Error> {
        let mut endpoint = match owner {
            Some(owner) => format!("/groups/{}/projects", encode_project(owner)),
            None => "/projects?membership=true".to_string(),
        };

        let mut repositories = Vec::new();
        let mut page = 1;
        loop {
            let mut response = self.projects_page(&endpoint, visibility, page).await?;

            if let (Some(owner), StatusCode::NOT_FOUND) = (owner, response.status()) {
                if page == 1 {
                    debug!(owner, "not a group, listing user projects");
                    endpoint = format!("/users/{}/projects", encode_project(owner));
                    response = self.projects_page(&endpoint, visibility, page).await?;
                }
            }

            let response = expect_status(KIND, response, StatusCode::OK, "list projects").await?;
            let batch: Vec<ProjectSummary> = decode_json(KIND, response).await?;
            let last_page = batch.len() < PER_PAGE;

            for project in batch {
                let private = project.visibility != "public";
                if !visibility.admits(private) || !self.has_go_mod(&project).await {
                    continue;
                }
                repositories.push(HostedRepository {
                    name: project.name,
                    path: project.path_with_namespace,
                    description: project.description.unwrap_or_default(),
                    web_url: project.web_url,
                    private,
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
            .authorized(self.client.get(self.project_url(repo_path, "/repository/tags")))
            .send()
            .await
            .map_err(transport_error)?;
        let response = expect_status(KIND, response, StatusCode::OK, "list tags").await?;
        let tags: Vec<Tag> = decode_json(KIND, response).await?;

        Ok(tags
            .into_iter()
            .map(|tag| VersionTag {
                name: tag.name,
                date: tag
                    .commit
                    .created_at
                    .map(|d| d.chars().take(10).collect())
                    .unwrap_or_default(),
            })
            .collect())
    }

    #[instrument(skip(self), fields(api = %self.api_url))]
    async fn create_tag(&self, repo_path: &str, tag: &str) -> Result<(), Error> {
        let branch = self.default_branch(repo_path).await?;
        debug!(branch = %branch, "tagging default branch");

        let response = self
            .authorized(self.client.post(self.project_url(repo_path, "/repository/tags")))
            .form(&[("tag_name", tag), ("ref", branch.as_str())])
            .send()
            .await
            .map_err(transport_error)?;
        expect_status(KIND, response, StatusCode::CREATED, "create tag").await?;
        Ok(())
    }
}
