//! Direct GitHub REST API backend.
//!
//! Uses the contents, repositories and code search endpoints via
//! reqwest. A token is optional; anonymous requests work against
//! public repositories but hit rate limits quickly.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;

use super::{Capabilities, RemoteError, RemoteRepositoryClient};
use crate::config::RemoteConfig;
use crate::models::{RepoEntry, RepositoryStats};

/// Maximum page size accepted by the search API.
const SEARCH_PAGE_SIZE: usize = 100;

/// Client for the GitHub REST API.
pub struct GitHubClient {
    http: reqwest::Client,
    api_url: Url,
    token: Option<String>,
    fallback_branch: String,
    capabilities: Capabilities,
    search_max_results: usize,
    timeout_secs: u64,
}

impl GitHubClient {
    /// Create a client from the remote config.
    ///
    /// Search capability follows `remote.search` (off by default for
    /// this backend, since code search requires authentication).
    pub fn new(config: &RemoteConfig) -> Result<Self, RemoteError> {
        let api_url = Url::parse(&config.api_url)
            .map_err(|e| RemoteError::Transport(format!("invalid API url {}: {e}", config.api_url)))?;
        let http = reqwest::Client::builder()
            .user_agent(format!(
                "{}/{}",
                crate::constants::APP_NAME,
                crate::constants::VERSION
            ))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RemoteError::Transport(e.to_string()))?;

        if config.token.is_none() {
            tracing::warn!("no GitHub token configured; requests are unauthenticated");
        }

        Ok(Self {
            http,
            api_url,
            token: config.token.clone(),
            fallback_branch: config.fallback_branch.clone(),
            capabilities: Capabilities {
                search: config.search_enabled(),
            },
            search_max_results: config.search_max_results,
            timeout_secs: config.timeout_secs,
        })
    }

    /// Build an endpoint URL from path segments.
    fn endpoint<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Result<Url, RemoteError> {
        let mut url = self.api_url.clone();
        url.path_segments_mut()
            .map_err(|_| RemoteError::Transport(format!("API url cannot be a base: {}", self.api_url)))?
            .pop_if_empty()
            .extend(segments.into_iter().filter(|s| !s.is_empty()));
        Ok(url)
    }

    fn contents_url(&self, owner: &str, repo: &str, path: &str) -> Result<Url, RemoteError> {
        let segments = ["repos", owner, repo, "contents"]
            .into_iter()
            .chain(path.split('/'));
        self.endpoint(segments)
    }

    /// GET a JSON document, mapping transport failures onto [`RemoteError`].
    async fn get_json(
        &self,
        url: Url,
        query: &[(&str, &str)],
    ) -> Result<serde_json::Value, RemoteError> {
        let mut request = self
            .http
            .get(url.clone())
            .header("Accept", "application/vnd.github+json")
            .query(query);
        if let Some(ref token) = self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| self.map_reqwest(&url, e))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteError::Transport(format!(
                "GET {} returned {status}: {}",
                url.path(),
                body.chars().take(200).collect::<String>()
            )));
        }
        response.json().await.map_err(|e| self.map_reqwest(&url, e))
    }

    fn map_reqwest(&self, url: &Url, err: reqwest::Error) -> RemoteError {
        if err.is_timeout() {
            RemoteError::Timeout {
                operation: format!("GET {}", url.path()),
                secs: self.timeout_secs,
            }
        } else if err.is_decode() {
            RemoteError::Protocol(format!("GET {}: {err}", url.path()))
        } else {
            RemoteError::Transport(format!("GET {}: {err}", url.path()))
        }
    }

    async fn repository_object(&self, owner: &str, repo: &str) -> Result<serde_json::Value, RemoteError> {
        let url = self.endpoint(["repos", owner, repo])?;
        self.get_json(url, &[]).await
    }
}

#[async_trait]
impl RemoteRepositoryClient for GitHubClient {
    fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    async fn list_entries(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        branch: &str,
    ) -> Result<Vec<RepoEntry>, RemoteError> {
        tracing::debug!("listing {owner}/{repo}:{path}@{branch}");
        let url = self.contents_url(owner, repo, path)?;
        let value = self.get_json(url, &[("ref", branch)]).await?;
        super::parse_entries(&value)
    }

    async fn fetch_content(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        branch: &str,
    ) -> Result<String, RemoteError> {
        let url = self.contents_url(owner, repo, path)?;
        let value = self.get_json(url, &[("ref", branch)]).await?;
        super::decode_file_object(path, &value)
    }

    async fn default_branch(&self, owner: &str, repo: &str) -> String {
        match self.repository_object(owner, repo).await {
            Ok(value) => {
                if let Some(branch) = value.get("default_branch").and_then(|v| v.as_str()) {
                    tracing::info!("using default branch: {branch}");
                    return branch.to_string();
                }
                tracing::warn!("repository {owner}/{repo} reported no default branch");
            }
            Err(e) => tracing::warn!("could not resolve default branch for {owner}/{repo}: {e}"),
        }
        tracing::info!("falling back to branch '{}'", self.fallback_branch);
        self.fallback_branch.clone()
    }

    async fn search_code(
        &self,
        owner: &str,
        repo: &str,
        query: &str,
    ) -> Result<Vec<String>, RemoteError> {
        let scope = format!("repo:{owner}/{repo}");
        let q = if query.contains(&scope) {
            query.to_string()
        } else {
            format!("{scope} {query}")
        };
        let url = self.endpoint(["search", "code"])?;
        let per_page = self.search_max_results.clamp(1, SEARCH_PAGE_SIZE).to_string();

        let mut results = Vec::new();
        let mut page: usize = 1;
        while results.len() < self.search_max_results {
            let page_str = page.to_string();
            let response = self
                .get_json(
                    url.clone(),
                    &[("q", q.as_str()), ("per_page", per_page.as_str()), ("page", page_str.as_str())],
                )
                .await?;

            let items = response
                .get("items")
                .and_then(|v| v.as_array())
                .cloned()
                .unwrap_or_default();
            if items.is_empty() {
                break;
            }
            results.extend(
                items
                    .iter()
                    .filter_map(|item| item.get("path").and_then(|p| p.as_str()))
                    .map(str::to_string),
            );

            let total = response
                .get("total_count")
                .and_then(|v| v.as_u64())
                .unwrap_or(0) as usize;
            if results.len() >= total {
                break;
            }
            page += 1;
        }

        results.truncate(self.search_max_results);
        Ok(results)
    }

    async fn repository_stats(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<Option<RepositoryStats>, RemoteError> {
        let value = self.repository_object(owner, repo).await?;
        Ok(RepositoryStats::from_github_json(&value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> GitHubClient {
        GitHubClient::new(&RemoteConfig::default()).unwrap()
    }

    #[test]
    fn contents_url_for_root_and_nested_paths() {
        let c = client();
        assert_eq!(
            c.contents_url("acme", "widgets", "").unwrap().as_str(),
            "https://api.github.com/repos/acme/widgets/contents"
        );
        assert_eq!(
            c.contents_url("acme", "widgets", "src/lib.rs").unwrap().as_str(),
            "https://api.github.com/repos/acme/widgets/contents/src/lib.rs"
        );
    }

    #[test]
    fn contents_url_escapes_segments() {
        let url = client().contents_url("acme", "widgets", "docs/my file.md").unwrap();
        assert!(url.as_str().ends_with("/contents/docs/my%20file.md"));
    }

    #[test]
    fn search_capability_follows_config() {
        assert!(!client().capabilities().search);
        let config = RemoteConfig {
            search: Some(true),
            ..RemoteConfig::default()
        };
        assert!(GitHubClient::new(&config).unwrap().capabilities().search);
    }

    #[test]
    fn invalid_api_url_is_rejected() {
        let config = RemoteConfig {
            api_url: "not a url".to_string(),
            ..RemoteConfig::default()
        };
        assert!(GitHubClient::new(&config).is_err());
    }

    #[tokio::test]
    async fn default_branch_falls_back_when_unreachable() {
        let config = RemoteConfig {
            api_url: "http://127.0.0.1:9".to_string(),
            fallback_branch: "trunk".to_string(),
            timeout_secs: 2,
            ..RemoteConfig::default()
        };
        let c = GitHubClient::new(&config).unwrap();
        assert_eq!(c.default_branch("acme", "widgets").await, "trunk");
    }
}
