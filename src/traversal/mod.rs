//! Repository traversal and content retrieval.
//!
//! Walks the remote tree with an explicit worklist, filters candidates,
//! and fetches their bodies in bounded batches. Results are cached per
//! (owner, repo, branch).

pub mod fetch;
pub mod filter;

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use crate::cache::CacheEngine;
use crate::config::{FetchConfig, TraversalConfig};
use crate::models::{RepoFileMap, RepoKey};
use crate::remote::RemoteRepositoryClient;

pub use fetch::fetch_all;
pub use filter::FileFilter;

/// Summary of one `repository_files` call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchReport {
    /// Branch the content was read from (`None` for a cache hit on an
    /// unspecified branch).
    pub branch: Option<String>,
    /// Paths that passed the filters.
    pub candidates: usize,
    /// Paths fetched successfully.
    pub fetched: usize,
    /// Paths whose fetch failed.
    pub failed: usize,
    /// The file map came from the cache.
    pub from_cache: bool,
}

/// Walks a remote repository and fetches its file bodies.
pub struct TraversalFetchEngine {
    client: Arc<dyn RemoteRepositoryClient>,
    cache: Arc<CacheEngine>,
}

impl TraversalFetchEngine {
    pub fn new(client: Arc<dyn RemoteRepositoryClient>, cache: Arc<CacheEngine>) -> Self {
        Self { client, cache }
    }

    /// Walk the tree from the root and return candidate file paths in
    /// discovery order.
    ///
    /// Each directory is listed at most once and each file path appears
    /// once. A listing failure is logged and that subtree skipped.
    pub async fn collect(&self, owner: &str, repo: &str, branch: &str, filter: &FileFilter) -> Vec<String> {
        let mut candidates = Vec::new();
        let mut visited: HashSet<String> = HashSet::new();
        let mut seen_files: HashSet<String> = HashSet::new();
        let mut worklist: VecDeque<String> = VecDeque::from([String::new()]);

        while let Some(dir) = worklist.pop_front() {
            if !visited.insert(dir.clone()) {
                continue;
            }

            let entries = match self.client.list_entries(owner, repo, &dir, branch).await {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::error!("error collecting files in '{dir}': {e}");
                    continue;
                }
            };

            for entry in entries {
                if filter.is_ignored(&entry.path) {
                    tracing::debug!("skipping ignored path: {}", entry.path);
                    continue;
                }
                if entry.is_dir() {
                    if !visited.contains(&entry.path) {
                        worklist.push_back(entry.path);
                    }
                } else if !seen_files.contains(&entry.path) && filter.accepts(&entry) {
                    seen_files.insert(entry.path.clone());
                    candidates.push(entry.path);
                }
            }
        }

        candidates
    }

    /// Fetch every candidate path. See [`fetch::fetch_all`].
    pub async fn fetch_all(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
        paths: &[String],
        batch_size: usize,
        max_workers: usize,
    ) -> RepoFileMap {
        fetch::fetch_all(&self.client, owner, repo, branch, paths, batch_size, max_workers).await
    }

    /// Produce the filtered file map for a repository.
    ///
    /// A cached map for (owner, repo, branch) is returned as-is unless
    /// `force_refresh` is set. An unspecified branch is resolved through
    /// the client. A non-empty result is written through to the cache
    /// under the branch as requested.
    pub async fn repository_files(
        &self,
        owner: &str,
        repo: &str,
        branch: Option<&str>,
        traversal: &TraversalConfig,
        fetch: &FetchConfig,
    ) -> (RepoFileMap, FetchReport) {
        let key = RepoKey::new(owner, repo, branch);

        if !fetch.force_refresh {
            if let Some(files) = self.cache.file_map(&key) {
                tracing::info!("using cached file map for {key} ({} files)", files.len());
                let report = FetchReport {
                    branch: branch.map(str::to_string),
                    candidates: files.len(),
                    fetched: files.len(),
                    failed: 0,
                    from_cache: true,
                };
                return (files, report);
            }
        }

        let branch = match branch {
            Some(b) => b.to_string(),
            None => self.client.default_branch(owner, repo).await,
        };

        let filter = FileFilter::from_config(traversal);
        let paths = self.collect(owner, repo, &branch, &filter).await;
        if paths.is_empty() {
            tracing::warn!("no files found or all files were filtered out");
            let report = FetchReport {
                branch: Some(branch),
                ..FetchReport::default()
            };
            return (RepoFileMap::new(), report);
        }
        tracing::info!("found {} files to fetch", paths.len());

        let files = self
            .fetch_all(owner, repo, &branch, &paths, fetch.batch_size, fetch.max_workers)
            .await;

        let report = FetchReport {
            branch: Some(branch),
            candidates: paths.len(),
            fetched: files.len(),
            failed: paths.len() - files.len(),
            from_cache: false,
        };
        if report.failed > 0 {
            tracing::warn!("{} of {} files could not be fetched", report.failed, report.candidates);
        }

        if !files.is_empty() {
            self.cache.put_file_map(&key, &files);
        }

        (files, report)
    }
}
