//! Section analysis orchestrator: cache replay, graph construction,
//! strategy dispatch, normalization, and persistence.

use std::collections::BTreeMap;
use std::sync::Arc;

use thiserror::Error;

use crate::cache::{CacheEngine, MetadataRecord, StructureRecord};
use crate::config::Config;
use crate::graph::DependencyGraphBuilder;
use crate::models::{AnalysisMethod, RepoFileMap, RepoKey, RepositoryStats, Section};
use crate::partition::{Partitioner, default_strategy, merge_small};
use crate::remote::{RemoteError, RemoteRepositoryClient};
use crate::traversal::{FetchReport, TraversalFetchEngine};

/// Errors from the orchestrator.
#[derive(Error, Debug)]
pub enum AnalyzeError {
    #[error("invalid section bounds: min {min} / max {max} (need 1 <= max and min <= max)")]
    InvalidBounds { min: usize, max: usize },
}

/// Parameters for one `analyze` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    pub method: AnalysisMethod,
    pub max_section_size: usize,
    pub min_section_size: usize,
    pub owner: Option<String>,
    pub repo: Option<String>,
    pub branch: Option<String>,
}

impl AnalysisRequest {
    /// A request with the configured method and bounds, no repository.
    pub fn from_config(config: &Config) -> Self {
        Self {
            method: config.sections.method,
            max_section_size: config.sections.max_section_size,
            min_section_size: config.sections.min_section_size,
            owner: None,
            repo: None,
            branch: None,
        }
    }

    /// Attach repository coordinates, enabling caching and search.
    pub fn for_repository(mut self, owner: &str, repo: &str, branch: Option<&str>) -> Self {
        self.owner = Some(owner.to_string());
        self.repo = Some(repo.to_string());
        self.branch = branch.map(str::to_string);
        self
    }

    fn key(&self) -> Option<RepoKey> {
        match (&self.owner, &self.repo) {
            (Some(owner), Some(repo)) => Some(RepoKey::new(owner.as_str(), repo.as_str(), self.branch.as_deref())),
            _ => None,
        }
    }

    fn validate(&self) -> Result<(), AnalyzeError> {
        if self.max_section_size == 0 || self.min_section_size > self.max_section_size {
            return Err(AnalyzeError::InvalidBounds {
                min: self.min_section_size,
                max: self.max_section_size,
            });
        }
        Ok(())
    }
}

/// Result of an end-to-end `run`.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub sections: Vec<Section>,
    pub report: FetchReport,
}

/// Drives traversal and partitioning for one remote backend.
pub struct SectionAnalyzer {
    client: Arc<dyn RemoteRepositoryClient>,
    config: Config,
    cache: Arc<CacheEngine>,
    strategies: BTreeMap<AnalysisMethod, Arc<dyn Partitioner>>,
}

impl SectionAnalyzer {
    /// Create an analyzer with the built-in strategies.
    pub fn new(client: Arc<dyn RemoteRepositoryClient>, config: &Config, cache: CacheEngine) -> Self {
        let strategies = AnalysisMethod::ALL
            .into_iter()
            .map(|m| (m, Arc::from(default_strategy(m))))
            .collect();
        Self {
            client,
            config: config.clone(),
            cache: Arc::new(cache),
            strategies,
        }
    }

    /// Replace the strategy used for `method`.
    pub fn with_strategy(mut self, method: AnalysisMethod, strategy: Arc<dyn Partitioner>) -> Self {
        self.strategies.insert(method, strategy);
        self
    }

    /// Partition `files` into sections.
    ///
    /// A stored structure whose file set equals the keys of `files` is
    /// replayed without running any strategy. Otherwise the selected
    /// strategy runs, undersized sections are merged, and structure and
    /// metadata are persisted when owner and repo are known.
    pub async fn analyze(&self, files: &RepoFileMap, request: &AnalysisRequest) -> Result<Vec<Section>, AnalyzeError> {
        request.validate()?;
        let key = request.key();

        if let Some(ref key) = key {
            if let Some(record) = self.cache.structure(key) {
                if record.fingerprint_matches(files) {
                    tracing::info!("reusing cached section structure for {key} ({})", record.method);
                    return Ok(record.rebuild(files));
                }
                tracing::debug!("cached structure for {key} is stale; recomputing");
            }
        }

        let method = request.method;
        let graph = if method.uses_graph() {
            let builder = match (&request.owner, &request.repo) {
                (Some(owner), Some(repo)) => DependencyGraphBuilder::with_search(Arc::clone(&self.client), owner, repo),
                _ => DependencyGraphBuilder::heuristic(),
            }
            .max_workers(self.config.fetch.max_workers)
            .max_results(self.config.remote.search_max_results);
            tracing::info!("building dependency graph ({:?} mode)", builder.mode());
            Some(builder.build(files).await)
        } else {
            None
        };

        let strategy = self
            .strategies
            .get(&method)
            .cloned()
            .unwrap_or_else(|| Arc::from(default_strategy(method)));
        let sections = strategy.partition(files, graph.as_ref(), request.max_section_size);
        let sections = merge_small(sections, request.min_section_size, graph.as_ref());
        tracing::info!("{method} analysis produced {} sections", sections.len());

        if let Some(ref key) = key {
            self.cache
                .put_structure(key, &StructureRecord::from_sections(key, files, &sections, method));
            self.cache
                .put_metadata(key, &MetadataRecord::from_sections(key, &sections, method));
        }

        Ok(sections)
    }

    /// Fetch a repository and partition it.
    ///
    /// `method` defaults to the configured one.
    pub async fn run(
        &self,
        owner: &str,
        repo: &str,
        branch: Option<&str>,
        method: Option<AnalysisMethod>,
    ) -> Result<Analysis, AnalyzeError> {
        let mut request = AnalysisRequest::from_config(&self.config).for_repository(owner, repo, branch);
        if let Some(method) = method {
            request.method = method;
        }
        request.validate()?;

        let engine = TraversalFetchEngine::new(Arc::clone(&self.client), Arc::clone(&self.cache));
        let (files, report) = engine
            .repository_files(owner, repo, branch, &self.config.traversal, &self.config.fetch)
            .await;
        tracing::info!(
            "retrieved {} files for {owner}/{repo}{}",
            files.len(),
            if report.from_cache { " (cached)" } else { "" }
        );

        let sections = self.analyze(&files, &request).await?;
        Ok(Analysis { sections, report })
    }

    /// Repository metadata from the backend.
    pub async fn repository_stats(&self, owner: &str, repo: &str) -> Result<Option<RepositoryStats>, RemoteError> {
        self.client.repository_stats(owner, repo).await
    }
}
