//! In-memory cache store, used when nothing should touch the disk.

use std::collections::HashMap;
use std::sync::Mutex;

use super::{CacheError, CacheStats, CacheStore, MetadataRecord, StructureRecord};
use crate::models::{RepoFileMap, RepoKey};

/// Process-local cache store.
#[derive(Default)]
pub struct MemoryStore {
    files: Mutex<HashMap<RepoKey, RepoFileMap>>,
    structures: Mutex<HashMap<RepoKey, StructureRecord>>,
    metadata: Mutex<HashMap<RepoKey, MetadataRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheStore for MemoryStore {
    fn get_file_map(&self, key: &RepoKey) -> Option<RepoFileMap> {
        self.files.lock().unwrap().get(key).cloned()
    }

    fn put_file_map(&self, key: &RepoKey, files: &RepoFileMap) {
        self.files.lock().unwrap().insert(key.clone(), files.clone());
    }

    fn get_structure(&self, key: &RepoKey) -> Option<StructureRecord> {
        self.structures.lock().unwrap().get(key).cloned()
    }

    fn put_structure(&self, key: &RepoKey, record: &StructureRecord) {
        self.structures.lock().unwrap().insert(key.clone(), record.clone());
    }

    fn get_metadata(&self, key: &RepoKey) -> Option<MetadataRecord> {
        self.metadata.lock().unwrap().get(key).cloned()
    }

    fn put_metadata(&self, key: &RepoKey, record: &MetadataRecord) {
        self.metadata.lock().unwrap().insert(key.clone(), record.clone());
    }

    fn clear(&self) -> Result<CacheStats, CacheError> {
        let stats = self.stats()?;
        self.files.lock().unwrap().clear();
        self.structures.lock().unwrap().clear();
        self.metadata.lock().unwrap().clear();
        Ok(stats)
    }

    fn stats(&self) -> Result<CacheStats, CacheError> {
        let files = self.files.lock().unwrap();
        let structures = self.structures.lock().unwrap();
        let metadata = self.metadata.lock().unwrap();

        let mut repos: Vec<&RepoKey> = files
            .keys()
            .chain(structures.keys())
            .chain(metadata.keys())
            .collect();
        let entries = repos.len();
        repos.sort_by(|a, b| (&a.owner, &a.repo, &a.branch).cmp(&(&b.owner, &b.repo, &b.branch)));
        repos.dedup();

        let total_bytes = files
            .values()
            .flat_map(|m| m.iter())
            .map(|(path, content)| (path.len() + content.len()) as u64)
            .sum();

        Ok(CacheStats {
            repositories: repos.len(),
            entries,
            total_bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_count_repositories_and_records() {
        let store = MemoryStore::new();
        let a = RepoKey::new("o", "a", None);
        let b = RepoKey::new("o", "b", None);
        let files = RepoFileMap::from([("x".to_string(), "12345".to_string())]);
        store.put_file_map(&a, &files);
        store.put_file_map(&b, &files);

        let stats = store.stats().unwrap();
        assert_eq!(stats.repositories, 2);
        assert_eq!(stats.entries, 2);
        assert_eq!(stats.total_bytes, 12);
    }

    #[test]
    fn clear_empties_store() {
        let store = MemoryStore::new();
        let key = RepoKey::new("o", "a", None);
        store.put_file_map(&key, &RepoFileMap::new());
        let removed = store.clear().unwrap();
        assert_eq!(removed.entries, 1);
        assert!(store.get_file_map(&key).is_none());
    }
}
