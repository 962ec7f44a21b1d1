//! Minimum-size normalization.

use crate::graph::DependencyGraph;
use crate::models::Section;

/// Fold sections smaller than `min_size` into a neighbour.
///
/// Repeatedly takes the first undersized section and merges it into
/// the section with the most graph edges to it (ties go to the
/// following section, then the lowest index). Without a graph, or with
/// no connecting edges, the following section is used, or the
/// preceding one for the last section. The absorbing section keeps its
/// name and position. Stops once a single section remains.
pub fn merge_small(mut sections: Vec<Section>, min_size: usize, graph: Option<&DependencyGraph>) -> Vec<Section> {
    while sections.len() > 1 {
        let Some(index) = sections.iter().position(|s| s.len() < min_size) else {
            break;
        };
        let target = merge_target(&sections, index, graph);
        let small = sections.remove(index);
        let target = if target > index { target - 1 } else { target };
        tracing::debug!(
            "merging section '{}' ({} files) into '{}'",
            small.name,
            small.len(),
            sections[target].name
        );
        sections[target].absorb(small);
    }
    sections
}

fn merge_target(sections: &[Section], index: usize, graph: Option<&DependencyGraph>) -> usize {
    let next = if index + 1 < sections.len() { index + 1 } else { index - 1 };

    let Some(graph) = graph else {
        return next;
    };

    let small = &sections[index];
    let mut best: Option<(usize, usize)> = None;
    for (i, candidate) in sections.iter().enumerate() {
        if i == index {
            continue;
        }
        let weight = graph.edges_between(small.paths(), candidate.paths());
        if weight == 0 {
            continue;
        }
        best = match best {
            None => Some((i, weight)),
            Some((_, w)) if weight > w => Some((i, weight)),
            Some((b, w)) if weight == w && i == next && b != next => Some((i, weight)),
            keep => keep,
        };
    }

    best.map_or(next, |(i, _)| i)
}
