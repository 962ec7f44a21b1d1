//! CLI-bridged backend.
//!
//! Repository operations are delegated to an external executable that
//! proxies GitHub tool calls (e.g. an assistant CLI with a GitHub tool
//! server attached). Each call spawns `<executable> send`, writes a
//! request naming the tool and its JSON parameters to stdin, and parses
//! the JSON document out of stdout. Calls are bounded by a timeout.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use super::{Capabilities, RemoteError, RemoteRepositoryClient};
use crate::config::RemoteConfig;
use crate::models::{RepoEntry, RepositoryStats};

/// Regex for extracting content inside markdown code fences.
static FENCE_RE: std::sync::LazyLock<regex::Regex> =
    std::sync::LazyLock::new(|| regex::Regex::new(r"(?s)```(?:json)?\s*\n(.*?)\n```").unwrap());

/// Max characters of tool output echoed into error messages.
const ERROR_PREVIEW_LEN: usize = 300;

/// Backend that shells out to a tool-calling CLI.
pub struct BridgeClient {
    executable: String,
    timeout: Duration,
    fallback_branch: String,
    capabilities: Capabilities,
    search_max_results: usize,
}

impl BridgeClient {
    /// Create a bridge client from the remote config.
    ///
    /// Search is advertised by default, since the bridged tool server
    /// exposes code search.
    pub fn new(config: &RemoteConfig) -> Self {
        Self {
            executable: config.bridge_executable.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
            fallback_branch: config.fallback_branch.clone(),
            capabilities: Capabilities {
                search: config.search_enabled(),
            },
            search_max_results: config.search_max_results,
        }
    }

    /// Invoke one bridged tool and parse its JSON response.
    pub async fn call_tool(
        &self,
        tool: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, RemoteError> {
        let request = build_request(tool, &params);

        let mut child = tokio::process::Command::new(&self.executable)
            .arg("send")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| RemoteError::Transport(format!("failed to start {}: {e}", self.executable)))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(request.as_bytes())
                .await
                .map_err(|e| RemoteError::Transport(format!("failed to send {tool} request: {e}")))?;
        }

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| RemoteError::Timeout {
                operation: format!("bridged tool {tool}"),
                secs: self.timeout.as_secs(),
            })?
            .map_err(|e| RemoteError::Transport(format!("bridged tool {tool} failed: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::error!("bridged tool {tool} exited with {}: {stderr}", output.status);
            return Err(RemoteError::Transport(format!(
                "bridged tool {tool} exited with {}",
                output.status
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        extract_json(&stdout).ok_or_else(|| {
            RemoteError::Protocol(format!(
                "no JSON in {tool} response: {}",
                stdout.chars().take(ERROR_PREVIEW_LEN).collect::<String>()
            ))
        })
    }

    async fn repository_object(&self, owner: &str, repo: &str) -> Result<Option<serde_json::Value>, RemoteError> {
        let response = self
            .call_tool(
                "search_repositories",
                serde_json::json!({ "query": format!("repo:{owner}/{repo}") }),
            )
            .await?;
        let total = response.get("total_count").and_then(|v| v.as_u64()).unwrap_or(0);
        if total == 0 {
            return Ok(None);
        }
        Ok(response
            .get("items")
            .and_then(|v| v.as_array())
            .and_then(|items| items.first())
            .cloned())
    }
}

/// Compose the instruction sent to the bridge executable.
fn build_request(tool: &str, params: &serde_json::Value) -> String {
    let params_json = serde_json::to_string_pretty(params).unwrap_or_else(|_| "{}".to_string());
    format!(
        "I need to use the GitHub tool \"{tool}\" with the following parameters:\n\
        ```json\n{params_json}\n```\n\n\
        Please execute this tool and return only the raw JSON response without any \
        additional text, explanation, or formatting.\n"
    )
}

/// Find the JSON document in a tool response.
///
/// Prefers the first fenced block that parses; falls back to the whole
/// trimmed output.
fn extract_json(text: &str) -> Option<serde_json::Value> {
    for cap in FENCE_RE.captures_iter(text) {
        if let Some(inner) = cap.get(1) {
            if let Ok(value) = serde_json::from_str(inner.as_str().trim()) {
                return Some(value);
            }
        }
    }
    serde_json::from_str(text.trim()).ok()
}

#[async_trait]
impl RemoteRepositoryClient for BridgeClient {
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
        let value = self
            .call_tool(
                "get_file_contents",
                serde_json::json!({ "owner": owner, "repo": repo, "path": path, "branch": branch }),
            )
            .await?;
        super::parse_entries(&value)
    }

    async fn fetch_content(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        branch: &str,
    ) -> Result<String, RemoteError> {
        let value = self
            .call_tool(
                "get_file_contents",
                serde_json::json!({ "owner": owner, "repo": repo, "path": path, "branch": branch }),
            )
            .await?;
        super::decode_file_object(path, &value)
    }

    async fn default_branch(&self, owner: &str, repo: &str) -> String {
        match self.repository_object(owner, repo).await {
            Ok(Some(item)) => {
                if let Some(branch) = item.get("default_branch").and_then(|v| v.as_str()) {
                    tracing::info!("using default branch: {branch}");
                    return branch.to_string();
                }
            }
            Ok(None) => tracing::warn!("repository {owner}/{repo} not found via bridge"),
            Err(e) => tracing::error!("error getting default branch: {e}"),
        }
        tracing::info!("could not determine default branch, using '{}'", self.fallback_branch);
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
        let per_page = self.search_max_results.clamp(1, 100);

        let mut results = Vec::new();
        let mut page: usize = 1;
        while results.len() < self.search_max_results {
            let response = self
                .call_tool(
                    "search_code",
                    serde_json::json!({ "q": q, "page": page, "per_page": per_page }),
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
            let total = response.get("total_count").and_then(|v| v.as_u64()).unwrap_or(0) as usize;
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
        let item = self.repository_object(owner, repo).await?;
        if item.is_none() {
            tracing::warn!("could not get repository stats for {owner}/{repo}");
        }
        Ok(item.as_ref().and_then(RepositoryStats::from_github_json))
    }
}
