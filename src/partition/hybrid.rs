//! Structural seed refined by dependency clusters.

use super::dependency::cluster_groups;
use super::structural::directory_groups;
use super::{Partitioner, dedupe_names, into_sections};
use crate::graph::DependencyGraph;
use crate::models::{AnalysisMethod, RepoFileMap, Section};

/// Runs the structural grouping, then re-partitions every group still
/// larger than `max_size` by dependency clusters over its induced
/// subgraph. Subsections are named `parent/sub`.
pub struct HybridPartitioner;

impl Partitioner for HybridPartitioner {
    fn method(&self) -> AnalysisMethod {
        AnalysisMethod::Hybrid
    }

    fn partition(&self, files: &RepoFileMap, graph: Option<&DependencyGraph>, max_size: usize) -> Vec<Section> {
        let seeds = directory_groups(files.keys().map(String::as_str), max_size, false);

        let mut groups = Vec::with_capacity(seeds.len());
        for (name, paths) in seeds {
            if paths.len() <= max_size {
                groups.push((name, paths));
                continue;
            }
            let members: Vec<&str> = paths.iter().map(String::as_str).collect();
            let sub = graph.map(|g| g.induced_subgraph(members.iter().copied()));
            tracing::debug!("refining oversized section '{name}' ({} files)", members.len());
            for (sub_name, sub_paths) in cluster_groups(&members, sub.as_ref(), max_size) {
                groups.push((format!("{name}/{sub_name}"), sub_paths));
            }
        }

        dedupe_names(&mut groups);
        into_sections(groups, files)
    }
}
