//! RemoteRepositoryClient trait and transport backends.
//!
//! Every backend implements one capability trait. Optional features
//! (reference search) are advertised through a [`Capabilities`] value
//! fixed at construction; callers read it instead of probing.

pub mod bridge;
pub mod github;
pub mod references;

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use thiserror::Error;

use crate::config::RemoteConfig;
use crate::models::{BackendName, EntryKind, RepoEntry, RepositoryStats};

pub use bridge::BridgeClient;
pub use github::GitHubClient;

/// Errors from a remote backend.
#[derive(Error, Debug)]
pub enum RemoteError {
    /// A listing, fetch, or search call failed.
    #[error("transport error: {0}")]
    Transport(String),

    /// A bridged call exceeded its time bound.
    #[error("{operation} timed out after {secs}s")]
    Timeout { operation: String, secs: u64 },

    /// Fetched content was not valid text.
    #[error("failed to decode {path}: {reason}")]
    Decode { path: String, reason: String },

    /// The remote answered, but not in the expected shape.
    #[error("unexpected response: {0}")]
    Protocol(String),

    #[error("{0} is not supported by this backend")]
    Unsupported(&'static str),
}

/// Optional features a backend supports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    /// Backlink / code search is available.
    pub search: bool,
}

/// Capability contract implemented by every remote backend.
#[async_trait]
pub trait RemoteRepositoryClient: Send + Sync {
    /// Optional features, fixed when the client was built.
    fn capabilities(&self) -> Capabilities;

    /// List the entries of one directory (`""` is the repository root).
    async fn list_entries(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        branch: &str,
    ) -> Result<Vec<RepoEntry>, RemoteError>;

    /// Fetch one file body as text.
    async fn fetch_content(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        branch: &str,
    ) -> Result<String, RemoteError>;

    /// Resolve the default branch.
    ///
    /// Never fails: implementations log the problem and return their
    /// configured fallback name.
    async fn default_branch(&self, owner: &str, repo: &str) -> String;

    /// Run one code search query scoped to the repository and return
    /// the paths of matching files.
    async fn search_code(
        &self,
        _owner: &str,
        _repo: &str,
        _query: &str,
    ) -> Result<Vec<String>, RemoteError> {
        Err(RemoteError::Unsupported("code search"))
    }

    /// Find every file that references `filepath`.
    ///
    /// Runs each query from [`references::reference_queries`] and unions
    /// the results. The file itself is never part of the result.
    async fn search_references(
        &self,
        owner: &str,
        repo: &str,
        filepath: &str,
    ) -> Result<BTreeSet<String>, RemoteError> {
        let mut found = BTreeSet::new();
        for query in references::reference_queries(filepath) {
            let mut paths = self.search_code(owner, repo, &query).await?;
            paths.sort();
            found.extend(paths.into_iter().filter(|p| p != filepath));
        }
        Ok(found)
    }

    /// Repository metadata, when the backend can provide it.
    async fn repository_stats(
        &self,
        _owner: &str,
        _repo: &str,
    ) -> Result<Option<RepositoryStats>, RemoteError> {
        Ok(None)
    }
}

/// Build the backend selected in the config.
pub fn build_client(config: &RemoteConfig) -> Result<Arc<dyn RemoteRepositoryClient>, RemoteError> {
    let client: Arc<dyn RemoteRepositoryClient> = match config.backend {
        BackendName::GitHub => Arc::new(GitHubClient::new(config)?),
        BackendName::Bridge => Arc::new(BridgeClient::new(config)),
    };
    Ok(client)
}

/// Convert a GitHub-shaped contents listing into entries.
///
/// A single object (the path named a file) is treated as a one-item
/// listing. Symlinks and submodules are skipped.
pub(crate) fn parse_entries(value: &serde_json::Value) -> Result<Vec<RepoEntry>, RemoteError> {
    let items: Vec<&serde_json::Value> = match value {
        serde_json::Value::Array(items) => items.iter().collect(),
        serde_json::Value::Object(_) => vec![value],
        other => {
            return Err(RemoteError::Protocol(format!(
                "expected a directory listing, got {other}"
            )));
        }
    };

    let mut entries = Vec::with_capacity(items.len());
    for item in items {
        let path = item.get("path").and_then(|v| v.as_str()).unwrap_or_default();
        if path.is_empty() {
            continue;
        }
        let kind = match item.get("type").and_then(|v| v.as_str()) {
            Some("file") => EntryKind::File,
            Some("dir") => EntryKind::Dir,
            other => {
                tracing::debug!("skipping {path} of type {other:?}");
                continue;
            }
        };
        let name = item
            .get("name")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| crate::models::entry::file_name(path).to_string());
        entries.push(RepoEntry {
            name,
            path: path.to_string(),
            kind,
            size: item.get("size").and_then(|v| v.as_u64()).unwrap_or(0),
        });
    }
    Ok(entries)
}

/// Extract the text body from a GitHub-shaped file object.
pub(crate) fn decode_file_object(
    path: &str,
    value: &serde_json::Value,
) -> Result<String, RemoteError> {
    if value.is_array() {
        return Err(RemoteError::Protocol(format!("{path} is a directory")));
    }
    let content = value.get("content").and_then(|v| v.as_str()).unwrap_or_default();
    match value.get("encoding").and_then(|v| v.as_str()) {
        Some("base64") => decode_base64(path, content),
        _ => Ok(content.to_string()),
    }
}

/// Decode base64 content (GitHub wraps it at 60 columns) into UTF-8 text.
pub(crate) fn decode_base64(path: &str, content: &str) -> Result<String, RemoteError> {
    let compact: String = content.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| RemoteError::Decode {
            path: path.to_string(),
            reason: e.to_string(),
        })?;
    String::from_utf8(bytes).map_err(|e| RemoteError::Decode {
        path: path.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_directory_listing() {
        let value = serde_json::json!([
            { "name": "src", "path": "src", "type": "dir", "size": 0 },
            { "name": "README.md", "path": "README.md", "type": "file", "size": 120 },
            { "name": "vendor", "path": "vendor", "type": "submodule" }
        ]);
        let entries = parse_entries(&value).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0], RepoEntry::dir("src"));
        assert_eq!(entries[1], RepoEntry::file("README.md", 120));
    }

    #[test]
    fn parse_single_file_object() {
        let value = serde_json::json!({ "name": "a.py", "path": "pkg/a.py", "type": "file", "size": 3 });
        let entries = parse_entries(&value).unwrap();
        assert_eq!(entries, vec![RepoEntry::file("pkg/a.py", 3)]);
    }

    #[test]
    fn parse_rejects_scalar() {
        assert!(matches!(
            parse_entries(&serde_json::json!("nope")),
            Err(RemoteError::Protocol(_))
        ));
    }

    #[test]
    fn decode_wrapped_base64() {
        // "hello world\n" split across lines like the contents API does
        let value = serde_json::json!({ "content": "aGVsbG8g\nd29ybGQK\n", "encoding": "base64" });
        assert_eq!(decode_file_object("a.txt", &value).unwrap(), "hello world\n");
    }

    #[test]
    fn decode_plain_content() {
        let value = serde_json::json!({ "content": "raw" });
        assert_eq!(decode_file_object("a.txt", &value).unwrap(), "raw");
    }

    #[test]
    fn decode_invalid_utf8_is_decode_error() {
        // 0xff 0xfe is not valid UTF-8
        let err = decode_base64("blob.bin", "//4=").unwrap_err();
        assert!(matches!(err, RemoteError::Decode { ref path, .. } if path == "blob.bin"));
    }

    #[test]
    fn decode_directory_is_protocol_error() {
        let err = decode_file_object("src", &serde_json::json!([])).unwrap_err();
        assert!(matches!(err, RemoteError::Protocol(_)));
    }

    struct FixedSearch;

    #[async_trait]
    impl RemoteRepositoryClient for FixedSearch {
        fn capabilities(&self) -> Capabilities {
            Capabilities { search: true }
        }
        async fn list_entries(&self, _: &str, _: &str, _: &str, _: &str) -> Result<Vec<RepoEntry>, RemoteError> {
            Ok(vec![])
        }
        async fn fetch_content(&self, _: &str, _: &str, _: &str, _: &str) -> Result<String, RemoteError> {
            Ok(String::new())
        }
        async fn default_branch(&self, _: &str, _: &str) -> String {
            "main".to_string()
        }
        async fn search_code(&self, _: &str, _: &str, query: &str) -> Result<Vec<String>, RemoteError> {
            if query.contains("import util") {
                Ok(vec!["app/main.py".to_string(), "lib/util.py".to_string()])
            } else {
                Ok(vec!["docs/index.md".to_string()])
            }
        }
    }

    #[tokio::test]
    async fn search_references_unions_queries_and_drops_self() {
        let refs = FixedSearch
            .search_references("o", "r", "lib/util.py")
            .await
            .unwrap();
        let refs: Vec<_> = refs.into_iter().collect();
        assert_eq!(refs, vec!["app/main.py", "docs/index.md"]);
    }

    #[tokio::test]
    async fn default_search_is_unsupported() {
        struct Plain;
        #[async_trait]
        impl RemoteRepositoryClient for Plain {
            fn capabilities(&self) -> Capabilities {
                Capabilities::default()
            }
            async fn list_entries(&self, _: &str, _: &str, _: &str, _: &str) -> Result<Vec<RepoEntry>, RemoteError> {
                Ok(vec![])
            }
            async fn fetch_content(&self, _: &str, _: &str, _: &str, _: &str) -> Result<String, RemoteError> {
                Ok(String::new())
            }
            async fn default_branch(&self, _: &str, _: &str) -> String {
                "main".to_string()
            }
        }
        let err = Plain.search_references("o", "r", "a.py").await.unwrap_err();
        assert!(matches!(err, RemoteError::Unsupported(_)));
        assert!(Plain.repository_stats("o", "r").await.unwrap().is_none());
    }
}
