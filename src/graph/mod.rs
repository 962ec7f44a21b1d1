//! Directed reference graph over repository files.
//!
//! An edge `src → dst` means `src` references `dst`. Adjacency is kept
//! in sorted maps so every traversal is deterministic.

pub mod builder;
pub mod heuristic;

use std::collections::{BTreeMap, BTreeSet, VecDeque};

pub use builder::{DependencyGraphBuilder, GraphMode};

/// Directed graph keyed by file path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyGraph {
    edges: BTreeMap<String, BTreeSet<String>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, path: &str) {
        if !self.edges.contains_key(path) {
            self.edges.insert(path.to_string(), BTreeSet::new());
        }
    }

    /// Add `src → dst`. Self-references are ignored.
    pub fn add_edge(&mut self, src: &str, dst: &str) {
        if src == dst {
            return;
        }
        self.add_node(dst);
        self.edges
            .entry(src.to_string())
            .or_default()
            .insert(dst.to_string());
    }

    pub fn contains(&self, path: &str) -> bool {
        self.edges.contains_key(path)
    }

    pub fn has_edge(&self, src: &str, dst: &str) -> bool {
        self.edges.get(src).is_some_and(|out| out.contains(dst))
    }

    /// Nodes in path order.
    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        self.edges.keys().map(String::as_str)
    }

    /// Outgoing neighbours of `path`, in path order.
    pub fn successors(&self, path: &str) -> impl Iterator<Item = &str> {
        self.edges
            .get(path)
            .into_iter()
            .flat_map(|out| out.iter().map(String::as_str))
    }

    /// All edges as `(src, dst)` pairs, sorted.
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str)> {
        self.edges
            .iter()
            .flat_map(|(src, out)| out.iter().map(move |dst| (src.as_str(), dst.as_str())))
    }

    pub fn node_count(&self) -> usize {
        self.edges.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// The subgraph on `keep`: only those nodes and the edges between them.
    pub fn induced_subgraph<'a>(&self, keep: impl IntoIterator<Item = &'a str>) -> DependencyGraph {
        let keep: BTreeSet<&str> = keep.into_iter().collect();
        let mut sub = DependencyGraph::new();
        for node in &keep {
            sub.add_node(node);
        }
        for (src, dst) in self.edges() {
            if keep.contains(src) && keep.contains(dst) {
                sub.add_edge(src, dst);
            }
        }
        sub
    }

    /// Undirected adjacency: each node maps to everything it references
    /// or is referenced by.
    pub fn undirected(&self) -> BTreeMap<&str, BTreeSet<&str>> {
        let mut adj: BTreeMap<&str, BTreeSet<&str>> =
            self.nodes().map(|n| (n, BTreeSet::new())).collect();
        for (src, dst) in self.edges() {
            adj.entry(src).or_default().insert(dst);
            adj.entry(dst).or_default().insert(src);
        }
        adj
    }

    /// Weakly connected components, each sorted, ordered by smallest member.
    pub fn components(&self) -> Vec<Vec<&str>> {
        let adj = self.undirected();
        let mut seen: BTreeSet<&str> = BTreeSet::new();
        let mut components = Vec::new();

        for &start in adj.keys() {
            if seen.contains(start) {
                continue;
            }
            let mut component = Vec::new();
            let mut queue = VecDeque::from([start]);
            seen.insert(start);
            while let Some(node) = queue.pop_front() {
                component.push(node);
                for &next in &adj[node] {
                    if seen.insert(next) {
                        queue.push_back(next);
                    }
                }
            }
            component.sort_unstable();
            components.push(component);
        }
        components
    }

    /// Number of edges, in either direction, between two path sets.
    pub fn edges_between<'a>(
        &self,
        a: impl IntoIterator<Item = &'a str>,
        b: impl IntoIterator<Item = &'a str>,
    ) -> usize {
        let a: BTreeSet<&str> = a.into_iter().collect();
        let b: BTreeSet<&str> = b.into_iter().collect();
        let forward: usize = a
            .iter()
            .map(|src| self.successors(src).filter(|dst| b.contains(dst)).count())
            .sum();
        let backward: usize = b
            .iter()
            .map(|src| self.successors(src).filter(|dst| a.contains(dst)).count())
            .sum();
        forward + backward
    }
}
