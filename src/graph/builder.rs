//! Dependency graph construction.
//!
//! Heuristic mode scans file content locally. Enhanced mode adds
//! backlinks from the remote's reference search when the client
//! advertises it; any file whose search fails keeps its heuristic
//! edges only.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use super::DependencyGraph;
use super::heuristic::{ModuleIndex, extract_references};
use crate::models::RepoFileMap;
use crate::remote::{RemoteError, RemoteRepositoryClient};

/// How edges are discovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphMode {
    /// Local lexical scanning only.
    Heuristic,
    /// Lexical scanning plus remote reference search.
    Enhanced,
}

/// Where backlink searches are sent.
struct SearchTarget {
    client: Arc<dyn RemoteRepositoryClient>,
    owner: String,
    repo: String,
}

/// Builds a [`DependencyGraph`] over a file map.
pub struct DependencyGraphBuilder {
    search: Option<SearchTarget>,
    max_workers: usize,
    max_results: usize,
}

impl DependencyGraphBuilder {
    /// A builder that only scans content locally.
    pub fn heuristic() -> Self {
        Self {
            search: None,
            max_workers: 5,
            max_results: 100,
        }
    }

    /// A builder that also uses the client's reference search.
    ///
    /// Falls back to heuristic mode when the client does not advertise
    /// search.
    pub fn with_search(client: Arc<dyn RemoteRepositoryClient>, owner: &str, repo: &str) -> Self {
        let search = if client.capabilities().search {
            Some(SearchTarget {
                client,
                owner: owner.to_string(),
                repo: repo.to_string(),
            })
        } else {
            tracing::debug!("reference search unavailable; using heuristic graph");
            None
        };
        Self {
            search,
            ..Self::heuristic()
        }
    }

    /// Bound on concurrent search requests.
    pub fn max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers.max(1);
        self
    }

    /// Cap on referencing paths kept per file.
    pub fn max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn mode(&self) -> GraphMode {
        if self.search.is_some() {
            GraphMode::Enhanced
        } else {
            GraphMode::Heuristic
        }
    }

    /// Build the graph. Every file in `files` becomes a node.
    pub async fn build(&self, files: &RepoFileMap) -> DependencyGraph {
        let mut graph = heuristic_graph(files);

        if let Some(ref target) = self.search {
            let backlinks = self.search_backlinks(target, files).await;
            for (path, result) in backlinks {
                match result {
                    Ok(referrers) => {
                        let known = referrers
                            .iter()
                            .filter(|r| r.as_str() != path && files.contains_key(r.as_str()))
                            .take(self.max_results);
                        for referrer in known {
                            graph.add_edge(referrer, &path);
                        }
                    }
                    Err(e) => {
                        tracing::warn!("reference search failed for {path}, using heuristic edges: {e}");
                    }
                }
            }
        }

        tracing::debug!(
            "built {:?} dependency graph: {} nodes, {} edges",
            self.mode(),
            graph.node_count(),
            graph.edge_count()
        );
        graph
    }

    /// Run one reference search per file, bounded by `max_workers`.
    ///
    /// Results land in a sorted map, so completion order does not
    /// affect the graph.
    async fn search_backlinks(
        &self,
        target: &SearchTarget,
        files: &RepoFileMap,
    ) -> BTreeMap<String, Result<BTreeSet<String>, RemoteError>> {
        let semaphore = Arc::new(Semaphore::new(self.max_workers.max(1)));
        let mut join_set = JoinSet::new();

        for path in files.keys() {
            let client = Arc::clone(&target.client);
            let sem = Arc::clone(&semaphore);
            let owner = target.owner.clone();
            let repo = target.repo.clone();
            let path = path.clone();

            join_set.spawn(async move {
                let Ok(_permit) = sem.acquire().await else {
                    return (path, Err(RemoteError::Transport("search pool closed".to_string())));
                };
                let result = client.search_references(&owner, &repo, &path).await;
                (path, result)
            });
        }

        let mut results = BTreeMap::new();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((path, result)) => {
                    results.insert(path, result);
                }
                Err(e) => tracing::error!("reference search task panicked: {e}"),
            }
        }
        results
    }
}

impl Default for DependencyGraphBuilder {
    fn default() -> Self {
        Self::heuristic()
    }
}

/// Graph from lexical references alone.
pub fn heuristic_graph(files: &RepoFileMap) -> DependencyGraph {
    let index = ModuleIndex::new(files);
    let mut graph = DependencyGraph::new();
    for (path, content) in files {
        graph.add_node(path);
        for reference in extract_references(path, content) {
            for target in index.resolve(&reference) {
                graph.add_edge(path, target);
            }
        }
    }
    graph
}
