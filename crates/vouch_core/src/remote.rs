//! Parsing of git remote URLs, module references and release tags.

use std::sync::OnceLock;

use regex::Regex;

use crate::entities::{normalize_domain, ProviderKind};
use crate::error::Error;

fn ssh_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^git@([^:]+):(.+)$").expect("invalid regex"))
}

fn https_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^https?://([^/]+)/(.+)$").expect("invalid regex"))
}

fn version_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^v\d+\.\d+\.\d+$").expect("invalid regex"))
}

/// Release tags must look like `v1.2.3`
pub fn is_valid_version(tag: &str) -> bool {
    version_pattern().is_match(tag)
}

/// A repository on a hosting provider, as named by a git remote URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteRepository {
    pub domain: String,
    /// `owner/name` (or `group/subgroup/name` on GitLab)
    pub repo_path: String,
    pub owner: String,
    pub provider: ProviderKind,
}

impl RemoteRepository {
    /// Parse `git@host:owner/repo(.git)` or `http(s)://host/owner/repo(.git)`.
    pub fn parse(url: &str) -> Result<Self, Error> {
        let url = url.trim();
        let url = url.strip_suffix(".git").unwrap_or(url);

        let captures = ssh_pattern()
            .captures(url)
            .or_else(|| https_pattern().captures(url))
            .ok_or_else(|| Error::RemoteQuery(format!("unsupported remote url format: {}", url)))?;

        let domain = captures[1].to_string();
        let repo_path = captures[2].trim_matches('/').to_string();
        let owner = repo_path
            .split('/')
            .next()
            .filter(|o| !o.is_empty())
            .ok_or_else(|| Error::RemoteQuery(format!("remote url has no owner: {}", url)))?
            .to_string();

        Ok(Self {
            provider: ProviderKind::detect(&domain),
            domain,
            repo_path,
            owner,
        })
    }

    /// Web URL of the hosting instance, used to build a provider client
    pub fn base_url(&self) -> String {
        format!("https://{}", self.domain)
    }
}

/// A module path such as `github.com/acme/lib`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleRef {
    pub domain: String,
    pub owner: String,
}

impl ModuleRef {
    pub fn parse(module: &str) -> Result<Self, Error> {
        let normalized = normalize_domain(module);
        let mut parts = normalized.split('/').filter(|p| !p.is_empty());

        match (parts.next(), parts.next()) {
            (Some(domain), Some(owner)) => Ok(Self {
                domain: domain.to_string(),
                owner: owner.to_string(),
            }),
            _ => Err(Error::Other(format!(
                "invalid module path: {} (expected domain/owner/...)",
                module
            ))),
        }
    }
}
