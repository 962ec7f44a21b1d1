//! Reference-graph locality partitioning.
//!
//! Clusters are the weakly connected components of the graph restricted
//! to the input files. Files with no edges inside the input are grouped
//! by parent directory instead.
//!
//! An oversized cluster is split deterministically: members are ordered
//! breadth-first from the hub (highest degree, ties to the smallest
//! path) with neighbours visited in path order, then cut into
//! consecutive pieces of at most `max_size`.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use super::{Partitioner, chunk, dedupe_names, into_sections};
use crate::constants::ROOT_SECTION;
use crate::graph::DependencyGraph;
use crate::models::entry::{file_name, parent_dir};
use crate::models::{AnalysisMethod, RepoFileMap, Section};
use crate::remote::references::module_name;

/// Groups files by connected reference structure.
pub struct DependencyPartitioner;

impl Partitioner for DependencyPartitioner {
    fn method(&self) -> AnalysisMethod {
        AnalysisMethod::Dependency
    }

    fn partition(&self, files: &RepoFileMap, graph: Option<&DependencyGraph>, max_size: usize) -> Vec<Section> {
        let paths: Vec<&str> = files.keys().map(String::as_str).collect();
        let mut groups = cluster_groups(&paths, graph, max_size);
        dedupe_names(&mut groups);
        into_sections(groups, files)
    }
}

/// Named, size-bounded clusters over `paths`, ordered by smallest member.
///
/// Names are not deduplicated.
pub(crate) fn cluster_groups(
    paths: &[&str],
    graph: Option<&DependencyGraph>,
    max_size: usize,
) -> Vec<(String, Vec<String>)> {
    let restricted = match graph {
        Some(g) => g.induced_subgraph(paths.iter().copied()),
        None => {
            let mut g = DependencyGraph::new();
            for path in paths {
                g.add_node(path);
            }
            g
        }
    };
    let adj = restricted.undirected();

    // (smallest member, name, ordered members)
    let mut clusters: Vec<(String, String, Vec<String>)> = Vec::new();
    let mut loose: BTreeMap<&str, Vec<String>> = BTreeMap::new();

    for component in restricted.components() {
        if component.len() >= 2 {
            let hub = hub_of(&component, &adj);
            clusters.push((
                component[0].to_string(),
                module_name(hub).to_string(),
                bfs_order(hub, &adj),
            ));
        } else {
            let path = component[0];
            loose.entry(parent_dir(path)).or_default().push(path.to_string());
        }
    }

    for (dir, members) in loose {
        let name = if dir.is_empty() { ROOT_SECTION } else { file_name(dir) };
        clusters.push((members[0].clone(), name.to_string(), members));
    }

    clusters.sort_by(|a, b| a.0.cmp(&b.0));
    clusters
        .into_iter()
        .flat_map(|(_, name, members)| chunk(&name, members, max_size))
        .collect()
}

/// Highest-degree member; ties go to the smallest path.
fn hub_of<'a>(component: &[&'a str], adj: &BTreeMap<&str, BTreeSet<&str>>) -> &'a str {
    let degree = |n: &str| adj.get(n).map_or(0, BTreeSet::len);
    let mut hub = component[0];
    for &node in &component[1..] {
        if degree(node) > degree(hub) {
            hub = node;
        }
    }
    hub
}

fn bfs_order(start: &str, adj: &BTreeMap<&str, BTreeSet<&str>>) -> Vec<String> {
    let mut order = Vec::new();
    let mut seen = BTreeSet::from([start]);
    let mut queue = VecDeque::from([start]);
    while let Some(node) = queue.pop_front() {
        order.push(node.to_string());
        if let Some(neighbours) = adj.get(node) {
            for &next in neighbours {
                if seen.insert(next) {
                    queue.push_back(next);
                }
            }
        }
    }
    order
}
