//! Section partitioning strategies.
//!
//! Each strategy turns a file map (and optionally a dependency graph)
//! into an ordered, disjoint, exhaustive set of sections no larger than
//! `max_size`. [`merge_small`] then folds undersized sections into a
//! neighbour.

pub mod dependency;
pub mod hybrid;
pub mod merge;
pub mod structural;

use std::collections::{BTreeMap, HashMap};

use crate::graph::DependencyGraph;
use crate::models::{AnalysisMethod, RepoFileMap, Section};

pub use dependency::DependencyPartitioner;
pub use hybrid::HybridPartitioner;
pub use merge::merge_small;
pub use structural::StructuralPartitioner;

/// One partitioning strategy.
pub trait Partitioner: Send + Sync {
    /// The method this strategy implements.
    fn method(&self) -> AnalysisMethod;

    /// Split `files` into sections of at most `max_size` files.
    ///
    /// Must be deterministic: equal inputs yield equal names,
    /// membership and order.
    fn partition(&self, files: &RepoFileMap, graph: Option<&DependencyGraph>, max_size: usize) -> Vec<Section>;
}

/// The built-in strategy for a method.
pub fn default_strategy(method: AnalysisMethod) -> Box<dyn Partitioner> {
    match method {
        AnalysisMethod::Structural => Box::new(StructuralPartitioner),
        AnalysisMethod::Dependency => Box::new(DependencyPartitioner),
        AnalysisMethod::Hybrid => Box::new(HybridPartitioner),
    }
}

/// Cut an ordered group into pieces of at most `max_size`.
///
/// A group that fits keeps its name; otherwise pieces are named
/// `name (1)`, `name (2)`, ...
pub(crate) fn chunk(name: &str, paths: Vec<String>, max_size: usize) -> Vec<(String, Vec<String>)> {
    let max_size = max_size.max(1);
    if paths.len() <= max_size {
        return vec![(name.to_string(), paths)];
    }
    paths
        .chunks(max_size)
        .enumerate()
        .map(|(i, piece)| (format!("{name} ({})", i + 1), piece.to_vec()))
        .collect()
}

/// Make names unique in order: repeats become `name-2`, `name-3`, ...
pub(crate) fn dedupe_names(groups: &mut [(String, Vec<String>)]) {
    let mut taken: HashMap<String, usize> = HashMap::new();
    for (name, _) in groups.iter() {
        taken.entry(name.clone()).or_insert(0);
    }
    let mut seen: HashMap<String, usize> = HashMap::new();
    for (name, _) in groups.iter_mut() {
        let count = seen.entry(name.clone()).or_insert(0);
        *count += 1;
        if *count == 1 {
            continue;
        }
        let mut n = *count;
        let mut candidate = format!("{name}-{n}");
        while taken.contains_key(&candidate) {
            n += 1;
            candidate = format!("{name}-{n}");
        }
        taken.insert(candidate.clone(), 0);
        *name = candidate;
    }
}

/// Attach content from `files` to named path groups.
pub(crate) fn into_sections(groups: Vec<(String, Vec<String>)>, files: &RepoFileMap) -> Vec<Section> {
    groups
        .into_iter()
        .filter(|(_, paths)| !paths.is_empty())
        .map(|(name, paths)| {
            let members: BTreeMap<String, String> = paths
                .into_iter()
                .filter_map(|p| files.get(&p).map(|c| (p, c.clone())))
                .collect();
            Section::new(name, members)
        })
        .collect()
}
