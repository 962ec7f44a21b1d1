//! Repository listing entries and the fetched file map.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Path → text content for every fetched file.
///
/// Sorted so that every consumer iterates files in the same order.
pub type RepoFileMap = BTreeMap<String, String>;

/// Whether a listing entry is a file or a directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Dir,
}

/// One entry from a directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoEntry {
    pub name: String,
    /// Path relative to the repository root, `/`-separated.
    pub path: String,
    pub kind: EntryKind,
    /// Size in bytes (0 for directories).
    #[serde(default)]
    pub size: u64,
}

impl RepoEntry {
    /// Build a file entry, deriving `name` from the last path segment.
    pub fn file(path: impl Into<String>, size: u64) -> Self {
        let path = path.into();
        Self {
            name: file_name(&path).to_string(),
            path,
            kind: EntryKind::File,
            size,
        }
    }

    /// Build a directory entry, deriving `name` from the last path segment.
    pub fn dir(path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            name: file_name(&path).to_string(),
            path,
            kind: EntryKind::Dir,
            size: 0,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Dir
    }
}

/// Last `/`-separated segment of a repository path.
pub fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Parent directory of a repository path (`""` for root-level paths).
pub fn parent_dir(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[..idx],
        None => "",
    }
}

/// File name without its final extension.
pub fn file_stem(path: &str) -> &str {
    let name = file_name(path);
    match name.rfind('.') {
        Some(0) | None => name,
        Some(idx) => &name[..idx],
    }
}

/// Final extension including the dot (`".py"`), or `""`.
pub fn extension(path: &str) -> &str {
    let name = file_name(path);
    match name.rfind('.') {
        Some(0) | None => "",
        Some(idx) => &name[idx..],
    }
}
