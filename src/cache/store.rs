//! Filesystem-based cache store.
//!
//! Stores records as JSON files in `~/.config/sectioner/cache/<key>/`,
//! one file per record kind.

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;

use super::{CacheError, CacheStore, MetadataRecord, StructureRecord, cache_key};
use crate::models::{RepoFileMap, RepoKey};

const FILES_RECORD: &str = "files.json";
const STRUCTURE_RECORD: &str = "structure.json";
const METADATA_RECORD: &str = "metadata.json";

/// Filesystem-based cache store.
pub struct FileStore {
    cache_dir: Option<PathBuf>,
}

impl FileStore {
    /// Create a new file store using the default cache directory.
    pub fn new() -> Self {
        let cache_dir = dirs::config_dir().map(|d| d.join(crate::constants::CONFIG_DIR).join("cache"));
        Self { cache_dir }
    }

    /// Create a file store with a specific cache directory.
    pub fn new_with_dir(cache_dir: PathBuf) -> Self {
        Self {
            cache_dir: Some(cache_dir),
        }
    }

    /// Get the file path for one record of a repository.
    fn record_path(&self, key: &RepoKey, record: &str) -> Option<PathBuf> {
        self.cache_dir
            .as_ref()
            .map(|dir| dir.join(cache_key(key)).join(record))
    }

    fn read<T: DeserializeOwned>(&self, key: &RepoKey, record: &str) -> Option<T> {
        let path = self.record_path(key, record)?;
        if !path.exists() {
            return None;
        }

        let content = std::fs::read_to_string(&path).ok()?;
        match serde_json::from_str(&content) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("ignoring unreadable cache record {}: {e}", path.display());
                None
            }
        }
    }

    fn write<T: Serialize + ?Sized>(&self, key: &RepoKey, record: &str, value: &T) {
        let Some(path) = self.record_path(key, record) else {
            return;
        };

        // Ensure the per-repository directory exists
        if let Some(parent) = path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                tracing::warn!("cannot create cache directory {}: {e}", parent.display());
                return;
            }
        }

        let content = match serde_json::to_string(value) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!("cannot serialize cache record {record}: {e}");
                return;
            }
        };

        if let Err(e) = std::fs::write(&path, content) {
            tracing::warn!("cannot write cache record {}: {e}", path.display());
        }
    }
}

impl Default for FileStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheStore for FileStore {
    fn get_file_map(&self, key: &RepoKey) -> Option<RepoFileMap> {
        self.read(key, FILES_RECORD)
    }

    fn put_file_map(&self, key: &RepoKey, files: &RepoFileMap) {
        self.write(key, FILES_RECORD, files);
    }

    fn get_structure(&self, key: &RepoKey) -> Option<StructureRecord> {
        self.read(key, STRUCTURE_RECORD)
    }

    fn put_structure(&self, key: &RepoKey, record: &StructureRecord) {
        self.write(key, STRUCTURE_RECORD, record);
    }

    fn get_metadata(&self, key: &RepoKey) -> Option<MetadataRecord> {
        self.read(key, METADATA_RECORD)
    }

    fn put_metadata(&self, key: &RepoKey, record: &MetadataRecord) {
        self.write(key, METADATA_RECORD, record);
    }

    fn clear(&self) -> Result<CacheStats, CacheError> {
        let stats = self.stats()?;
        if let Some(ref dir) = self.cache_dir {
            if dir.exists() {
                std::fs::remove_dir_all(dir)?;
            }
        }
        Ok(stats)
    }

    fn stats(&self) -> Result<CacheStats, CacheError> {
        let mut stats = CacheStats::default();
        let Some(ref dir) = self.cache_dir else {
            return Ok(stats);
        };
        if !dir.exists() {
            return Ok(stats);
        }

        for repo_dir in std::fs::read_dir(dir)? {
            let repo_dir = repo_dir?;
            if !repo_dir.file_type()?.is_dir() {
                continue;
            }
            stats.repositories += 1;
            for entry in std::fs::read_dir(repo_dir.path())? {
                let entry = entry?;
                let path = entry.path();
                if path.extension().is_some_and(|e| e == "json") {
                    stats.entries += 1;
                    stats.total_bytes += entry.metadata().map(|m| m.len()).unwrap_or(0);
                }
            }
        }

        Ok(stats)
    }

    fn path(&self) -> Option<&Path> {
        self.cache_dir.as_deref()
    }
}

/// Statistics about the cache.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of repositories with at least one record.
    pub repositories: usize,
    /// Number of cached records.
    pub entries: usize,
    /// Total size in bytes.
    pub total_bytes: u64,
}

impl CacheStats {
    /// Format total_bytes as a human-readable string.
    pub fn human_size(&self) -> String {
        const KB: u64 = 1024;
        const MB: u64 = 1024 * KB;

        if self.total_bytes >= MB {
            format!("{:.1} MiB", self.total_bytes as f64 / MB as f64)
        } else if self.total_bytes >= KB {
            format!("{:.1} KiB", self.total_bytes as f64 / KB as f64)
        } else {
            format!("{} B", self.total_bytes)
        }
    }
}
