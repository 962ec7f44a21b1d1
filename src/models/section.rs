//! Section type: a named, bounded group of files.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A named group of files forming one summarization unit.
///
/// Names may be hierarchical (`"src/engine"`). Within one partition,
/// sections are disjoint and together cover every input file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub name: String,
    /// Path → content, a subset of the analysed file map.
    pub files: BTreeMap<String, String>,
}

impl Section {
    pub fn new(name: impl Into<String>, files: BTreeMap<String, String>) -> Self {
        Self {
            name: name.into(),
            files,
        }
    }

    /// Number of files in the section.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// File paths in sorted order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    /// Move every file from `other` into this section.
    pub fn absorb(&mut self, other: Section) {
        self.files.extend(other.files);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn files(paths: &[&str]) -> BTreeMap<String, String> {
        paths.iter().map(|p| (p.to_string(), String::new())).collect()
    }

    #[test]
    fn absorb_moves_all_files() {
        let mut a = Section::new("a", files(&["a/1.rs"]));
        let b = Section::new("b", files(&["b/1.rs", "b/2.rs"]));
        a.absorb(b);
        assert_eq!(a.len(), 3);
        assert_eq!(a.name, "a");
        assert_eq!(a.paths().collect::<Vec<_>>(), vec!["a/1.rs", "b/1.rs", "b/2.rs"]);
    }

    #[test]
    fn empty_section() {
        let s = Section::new("x", BTreeMap::new());
        assert!(s.is_empty());
        assert_eq!(s.len(), 0);
    }
}
