//! Repository cache: file maps, section structure, and metadata.
//!
//! Every record is keyed by (owner, repo, branch). A lookup returns
//! `None` on a miss, which is distinct from a stored-but-empty value.

pub mod memory;
pub mod store;

use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::config::CacheConfig;
use crate::models::{AnalysisMethod, RepoFileMap, RepoKey, Section};

pub use memory::MemoryStore;
pub use store::{CacheStats, FileStore};

/// Errors from cache maintenance operations.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("cache I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Compute a cache key from the repository coordinates.
///
/// `None` and `Some("")` branches hash differently from any named branch.
pub fn cache_key(key: &RepoKey) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.owner.as_bytes());
    hasher.update([0]);
    hasher.update(key.repo.as_bytes());
    hasher.update([0]);
    match &key.branch {
        Some(branch) => {
            hasher.update([1]);
            hasher.update(branch.as_bytes());
        }
        None => hasher.update([0]),
    }
    hex::encode(hasher.finalize())
}

/// Seconds since the unix epoch, for record timestamps.
fn now_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Stored section structure for one repository snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructureRecord {
    pub owner: String,
    pub repo: String,
    pub branch: Option<String>,
    /// Section name → member paths, in section order.
    pub sections: IndexMap<String, Vec<String>>,
    /// Sorted set of every analysed path; validates reuse.
    pub files: Vec<String>,
    pub method: AnalysisMethod,
    pub updated_at: u64,
}

impl StructureRecord {
    /// Capture the structure of a computed section set.
    pub fn from_sections(
        key: &RepoKey,
        files: &RepoFileMap,
        sections: &[Section],
        method: AnalysisMethod,
    ) -> Self {
        Self {
            owner: key.owner.clone(),
            repo: key.repo.clone(),
            branch: key.branch.clone(),
            sections: sections
                .iter()
                .map(|s| (s.name.clone(), s.paths().map(str::to_string).collect()))
                .collect(),
            files: files.keys().cloned().collect(),
            method,
            updated_at: now_secs(),
        }
    }

    /// Whether the recorded file set is exactly the key set of `files`.
    pub fn fingerprint_matches(&self, files: &RepoFileMap) -> bool {
        self.files.len() == files.len() && self.files.iter().all(|p| files.contains_key(p))
    }

    /// Rebuild sections, re-joining content from the current file map.
    ///
    /// Paths missing from `files` are dropped; sections left empty are
    /// skipped.
    pub fn rebuild(&self, files: &RepoFileMap) -> Vec<Section> {
        self.sections
            .iter()
            .filter_map(|(name, paths)| {
                let members: std::collections::BTreeMap<String, String> = paths
                    .iter()
                    .filter_map(|p| files.get(p).map(|c| (p.clone(), c.clone())))
                    .collect();
                (!members.is_empty()).then(|| Section::new(name.clone(), members))
            })
            .collect()
    }
}

/// Summary metadata about the last analysis of a repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataRecord {
    pub owner: String,
    pub repo: String,
    pub branch: Option<String>,
    pub section_count: usize,
    pub method: AnalysisMethod,
    /// Section name → file count, in section order.
    pub sections: IndexMap<String, usize>,
    pub updated_at: u64,
}

impl MetadataRecord {
    pub fn from_sections(key: &RepoKey, sections: &[Section], method: AnalysisMethod) -> Self {
        Self {
            owner: key.owner.clone(),
            repo: key.repo.clone(),
            branch: key.branch.clone(),
            section_count: sections.len(),
            method,
            sections: sections.iter().map(|s| (s.name.clone(), s.len())).collect(),
            updated_at: now_secs(),
        }
    }
}

/// Persistence backend for repository records.
pub trait CacheStore: Send + Sync {
    fn get_file_map(&self, key: &RepoKey) -> Option<RepoFileMap>;
    fn put_file_map(&self, key: &RepoKey, files: &RepoFileMap);
    fn get_structure(&self, key: &RepoKey) -> Option<StructureRecord>;
    fn put_structure(&self, key: &RepoKey, record: &StructureRecord);
    fn get_metadata(&self, key: &RepoKey) -> Option<MetadataRecord>;
    fn put_metadata(&self, key: &RepoKey, record: &MetadataRecord);

    /// Remove all cached entries, returning what was removed.
    fn clear(&self) -> Result<CacheStats, CacheError>;

    /// Compute statistics about the cache.
    fn stats(&self) -> Result<CacheStats, CacheError>;

    /// Where the cache lives on disk, if anywhere.
    fn path(&self) -> Option<&Path> {
        None
    }
}

/// The cache engine: a store plus the enabled switch.
pub struct CacheEngine {
    enabled: bool,
    store: Box<dyn CacheStore>,
}

impl CacheEngine {
    /// Create a new cache engine backed by the default on-disk store.
    pub fn new(enabled: bool) -> Self {
        Self::with_store(enabled, Box::new(FileStore::new()))
    }

    /// Create a file-backed engine from the `[cache]` config table.
    pub fn from_config(config: &CacheConfig) -> Self {
        let store = match config.dir {
            Some(ref dir) => FileStore::new_with_dir(dir.clone()),
            None => FileStore::new(),
        };
        Self::with_store(config.enabled, Box::new(store))
    }

    /// Create a cache engine over an explicit store.
    pub fn with_store(enabled: bool, store: Box<dyn CacheStore>) -> Self {
        Self { enabled, store }
    }

    /// A cache that never hits and never writes.
    pub fn disabled() -> Self {
        Self::with_store(false, Box::new(MemoryStore::new()))
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn file_map(&self, key: &RepoKey) -> Option<RepoFileMap> {
        if !self.enabled {
            return None;
        }
        self.store.get_file_map(key)
    }

    pub fn put_file_map(&self, key: &RepoKey, files: &RepoFileMap) {
        if !self.enabled {
            return;
        }
        self.store.put_file_map(key, files);
    }

    pub fn structure(&self, key: &RepoKey) -> Option<StructureRecord> {
        if !self.enabled {
            return None;
        }
        self.store.get_structure(key)
    }

    pub fn put_structure(&self, key: &RepoKey, record: &StructureRecord) {
        if !self.enabled {
            return;
        }
        self.store.put_structure(key, record);
    }

    pub fn metadata(&self, key: &RepoKey) -> Option<MetadataRecord> {
        if !self.enabled {
            return None;
        }
        self.store.get_metadata(key)
    }

    pub fn put_metadata(&self, key: &RepoKey, record: &MetadataRecord) {
        if !self.enabled {
            return;
        }
        self.store.put_metadata(key, record);
    }

    /// Remove all cached entries.
    pub fn clear(&self) -> Result<CacheStats, CacheError> {
        self.store.clear()
    }

    /// Compute statistics about the cache.
    pub fn stats(&self) -> Result<CacheStats, CacheError> {
        self.store.stats()
    }

    /// Return the cache directory path.
    pub fn path(&self) -> Option<&Path> {
        self.store.path()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn files(paths: &[&str]) -> RepoFileMap {
        paths.iter().map(|p| (p.to_string(), format!("// {p}"))).collect()
    }

    #[test]
    fn cache_key_deterministic() {
        let k1 = cache_key(&RepoKey::new("o", "r", Some("main")));
        let k2 = cache_key(&RepoKey::new("o", "r", Some("main")));
        assert_eq!(k1, k2);
    }

    #[test]
    fn cache_key_varies_with_branch() {
        let main = cache_key(&RepoKey::new("o", "r", Some("main")));
        let dev = cache_key(&RepoKey::new("o", "r", Some("dev")));
        let none = cache_key(&RepoKey::new("o", "r", None));
        let empty = cache_key(&RepoKey::new("o", "r", Some("")));
        assert_ne!(main, dev);
        assert_ne!(main, none);
        assert_ne!(none, empty);
    }

    #[test]
    fn cache_key_does_not_concatenate_ambiguously() {
        let a = cache_key(&RepoKey::new("ab", "c", None));
        let b = cache_key(&RepoKey::new("a", "bc", None));
        assert_ne!(a, b);
    }

    #[test]
    fn fingerprint_requires_exact_key_set() {
        let key = RepoKey::new("o", "r", None);
        let map = files(&["a.rs", "b.rs"]);
        let sections = vec![Section::new("all", map.clone())];
        let record = StructureRecord::from_sections(&key, &map, &sections, AnalysisMethod::Structural);

        assert!(record.fingerprint_matches(&map));
        assert!(!record.fingerprint_matches(&files(&["a.rs"])));
        assert!(!record.fingerprint_matches(&files(&["a.rs", "b.rs", "c.rs"])));
        assert!(!record.fingerprint_matches(&files(&["a.rs", "x.rs"])));
    }

    #[test]
    fn rebuild_rejoins_current_content() {
        let key = RepoKey::new("o", "r", None);
        let old = files(&["a.rs", "b.rs"]);
        let sections = vec![
            Section::new("first", files(&["a.rs"])),
            Section::new("second", files(&["b.rs"])),
        ];
        let record = StructureRecord::from_sections(&key, &old, &sections, AnalysisMethod::Hybrid);

        let mut current = old.clone();
        current.insert("a.rs".to_string(), "fresh".to_string());
        let rebuilt = record.rebuild(&current);
        assert_eq!(rebuilt.len(), 2);
        assert_eq!(rebuilt[0].name, "first");
        assert_eq!(rebuilt[0].files["a.rs"], "fresh");
        assert_eq!(rebuilt[1].name, "second");
    }

    #[test]
    fn rebuild_skips_sections_without_current_files() {
        let key = RepoKey::new("o", "r", None);
        let old = files(&["a.rs", "b.rs"]);
        let sections = vec![
            Section::new("first", files(&["a.rs"])),
            Section::new("second", files(&["b.rs"])),
        ];
        let record = StructureRecord::from_sections(&key, &old, &sections, AnalysisMethod::Hybrid);
        let rebuilt = record.rebuild(&files(&["b.rs"]));
        assert_eq!(rebuilt.len(), 1);
        assert_eq!(rebuilt[0].name, "second");
    }

    #[test]
    fn metadata_counts_sections() {
        let key = RepoKey::new("o", "r", Some("main"));
        let sections = vec![
            Section::new("x", files(&["x/1", "x/2"])),
            Section::new("y", BTreeMap::from([("y/1".to_string(), String::new())])),
        ];
        let meta = MetadataRecord::from_sections(&key, &sections, AnalysisMethod::Dependency);
        assert_eq!(meta.section_count, 2);
        assert_eq!(meta.sections["x"], 2);
        assert_eq!(meta.sections["y"], 1);
        assert_eq!(meta.branch.as_deref(), Some("main"));
    }

    #[test]
    fn disabled_engine_never_hits() {
        let store = MemoryStore::new();
        let key = RepoKey::new("o", "r", None);
        store.put_file_map(&key, &files(&["a.rs"]));
        let engine = CacheEngine::with_store(false, Box::new(store));
        assert!(engine.file_map(&key).is_none());
        engine.put_file_map(&key, &files(&["b.rs"]));
        assert!(engine.file_map(&key).is_none());
    }

    #[test]
    fn empty_file_map_is_distinct_from_miss() {
        let engine = CacheEngine::with_store(true, Box::new(MemoryStore::new()));
        let key = RepoKey::new("o", "r", None);
        assert!(engine.file_map(&key).is_none());
        engine.put_file_map(&key, &RepoFileMap::new());
        assert_eq!(engine.file_map(&key), Some(RepoFileMap::new()));
    }

    #[test]
    fn from_config_honours_dir_and_switch() {
        let dir = tempfile::tempdir().unwrap();
        let config = CacheConfig {
            enabled: true,
            dir: Some(dir.path().to_path_buf()),
        };
        let engine = CacheEngine::from_config(&config);
        assert_eq!(engine.path(), Some(dir.path()));

        let key = RepoKey::new("o", "r", Some("main"));
        engine.put_file_map(&key, &files(&["a.rs"]));
        assert_eq!(engine.file_map(&key), Some(files(&["a.rs"])));

        let off = CacheEngine::from_config(&CacheConfig {
            enabled: false,
            dir: Some(dir.path().to_path_buf()),
        });
        assert!(off.file_map(&key).is_none());
    }
}
