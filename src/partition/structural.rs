//! Directory-prefix partitioning.

use std::collections::BTreeMap;

use super::{Partitioner, chunk, dedupe_names, into_sections};
use crate::constants::ROOT_SECTION;
use crate::graph::DependencyGraph;
use crate::models::{AnalysisMethod, RepoFileMap, Section};

/// Groups files by top-level directory, subdividing oversized groups by
/// the next path segment.
pub struct StructuralPartitioner;

impl Partitioner for StructuralPartitioner {
    fn method(&self) -> AnalysisMethod {
        AnalysisMethod::Structural
    }

    fn partition(&self, files: &RepoFileMap, _graph: Option<&DependencyGraph>, max_size: usize) -> Vec<Section> {
        let mut groups = directory_groups(files.keys().map(String::as_str), max_size, true);
        dedupe_names(&mut groups);
        into_sections(groups, files)
    }
}

/// Group sorted paths by directory prefix.
///
/// Root-level files form the `root` group. A directory holding more
/// than `max_size` files is split into one group for its direct files
/// (keeping the directory's name) and one per subdirectory
/// (`parent/child`). With `chunk_leaves`, a group of direct files that
/// is still too large is cut into numbered pieces; otherwise it is
/// returned oversized.
pub(crate) fn directory_groups<'a>(
    paths: impl IntoIterator<Item = &'a str>,
    max_size: usize,
    chunk_leaves: bool,
) -> Vec<(String, Vec<String>)> {
    let max_size = max_size.max(1);
    let mut root = Vec::new();
    let mut top: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for path in paths {
        match path.split_once('/') {
            Some((first, _)) => top.entry(first).or_default().push(path),
            None => root.push(path),
        }
    }

    let mut groups = Vec::new();
    if !root.is_empty() {
        groups.extend(leaf(ROOT_SECTION, root, max_size, chunk_leaves));
    }
    for (dir, paths) in top {
        subdivide(dir, dir, paths, max_size, chunk_leaves, &mut groups);
    }
    groups
}

fn subdivide(
    name: &str,
    dir: &str,
    paths: Vec<&str>,
    max_size: usize,
    chunk_leaves: bool,
    out: &mut Vec<(String, Vec<String>)>,
) {
    if paths.len() <= max_size {
        out.push((name.to_string(), owned(paths)));
        return;
    }

    let mut direct = Vec::new();
    let mut children: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for path in paths {
        let rest = &path[dir.len() + 1..];
        match rest.split_once('/') {
            Some((child, _)) => children.entry(child).or_default().push(path),
            None => direct.push(path),
        }
    }

    if !direct.is_empty() {
        out.extend(leaf(name, direct, max_size, chunk_leaves));
    }
    for (child, paths) in children {
        subdivide(
            &format!("{name}/{child}"),
            &format!("{dir}/{child}"),
            paths,
            max_size,
            chunk_leaves,
            out,
        );
    }
}

fn leaf(name: &str, paths: Vec<&str>, max_size: usize, chunk_leaves: bool) -> Vec<(String, Vec<String>)> {
    if chunk_leaves {
        chunk(name, owned(paths), max_size)
    } else {
        vec![(name.to_string(), owned(paths))]
    }
}

fn owned(paths: Vec<&str>) -> Vec<String> {
    paths.into_iter().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::partition::testing::{assert_exact_cover, files, layout};
    use pretty_assertions::assert_eq;

    fn section(name: &str, paths: &[&str]) -> (String, Vec<String>) {
        (name.to_string(), paths.iter().map(|p| p.to_string()).collect())
    }

    #[test]
    fn groups_by_top_level_directory() {
        let map = files(&["README.md", "setup.py", "docs/a.md", "src/x.py", "src/y.py"]);
        let sections = StructuralPartitioner.partition(&map, None, 10);
        assert_eq!(
            layout(&sections),
            vec![
                section("root", &["README.md", "setup.py"]),
                section("docs", &["docs/a.md"]),
                section("src", &["src/x.py", "src/y.py"]),
            ]
        );
    }

    #[test]
    fn oversized_directory_is_subdivided_by_next_segment() {
        let map = files(&[
            "src/lib.rs",
            "src/engine/a.rs",
            "src/engine/b.rs",
            "src/engine/c.rs",
            "src/io/read.rs",
        ]);
        let sections = StructuralPartitioner.partition(&map, None, 3);
        assert_eq!(
            layout(&sections),
            vec![
                section("src", &["src/lib.rs"]),
                section("src/engine", &["src/engine/a.rs", "src/engine/b.rs", "src/engine/c.rs"]),
                section("src/io", &["src/io/read.rs"]),
            ]
        );
    }

    #[test]
    fn flat_directory_is_chunked() {
        let map = files(&["d/1", "d/2", "d/3", "d/4", "d/5"]);
        let sections = StructuralPartitioner.partition(&map, None, 2);
        let names: Vec<_> = sections.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["d (1)", "d (2)", "d (3)"]);
        assert!(sections.iter().all(|s| s.len() <= 2));
        assert_exact_cover(&map, &sections);
    }

    #[test]
    fn root_named_directory_does_not_collide() {
        let map = files(&["a.txt", "root/b.txt"]);
        let sections = StructuralPartitioner.partition(&map, None, 10);
        let names: Vec<_> = sections.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["root", "root-2"]);
    }

    #[test]
    fn unchunked_groups_may_exceed_max() {
        let groups = directory_groups(["d/1", "d/2", "d/3"], 2, false);
        assert_eq!(groups, vec![section("d", &["d/1", "d/2", "d/3"])]);
    }

    #[test]
    fn deep_tree_respects_max_and_covers_input() {
        let paths: Vec<String> = (0..40)
            .map(|i| format!("pkg/m{}/sub{}/f{i}.py", i % 3, i % 2))
            .collect();
        let refs: Vec<&str> = paths.iter().map(String::as_str).collect();
        let map = files(&refs);
        let sections = StructuralPartitioner.partition(&map, None, 5);
        assert!(sections.iter().all(|s| s.len() <= 5));
        assert_exact_cover(&map, &sections);
    }

    #[test]
    fn empty_input_yields_no_sections() {
        assert!(StructuralPartitioner.partition(&RepoFileMap::new(), None, 5).is_empty());
    }
}
