//! Path filters applied while walking the repository tree.

use crate::config::TraversalConfig;
use crate::models::RepoEntry;

/// Decides which listing entries are candidates for fetching.
#[derive(Debug, Clone, Default)]
pub struct FileFilter {
    ignore_dirs: Vec<String>,
    binary_extensions: Vec<String>,
    max_file_size: u64,
    extensions: Vec<String>,
    include_patterns: Vec<String>,
}

impl FileFilter {
    pub fn from_config(config: &TraversalConfig) -> Self {
        Self {
            ignore_dirs: config.ignore_dirs.clone(),
            binary_extensions: config.binary_extensions.clone(),
            max_file_size: config.max_file_size,
            extensions: config.extensions.clone(),
            include_patterns: config.include_patterns.clone(),
        }
    }

    /// Whether the path contains an ignored-directory token.
    ///
    /// Matching is by substring, so `build` also drops `rebuild.py`.
    pub fn is_ignored(&self, path: &str) -> bool {
        self.ignore_dirs.iter().any(|token| path.contains(token.as_str()))
    }

    /// Whether a file path passes the extension rules.
    pub fn should_include(&self, path: &str) -> bool {
        if !self.extensions.is_empty() && !self.extensions.iter().any(|ext| path.ends_with(ext.as_str())) {
            // Include patterns override the allow-list
            return self.include_patterns.iter().any(|p| path.contains(p.as_str()));
        }

        !self.binary_extensions.iter().any(|ext| path.ends_with(ext.as_str()))
    }

    /// Full check for a file entry: size limit, then extension rules.
    pub fn accepts(&self, entry: &RepoEntry) -> bool {
        if entry.size > self.max_file_size {
            tracing::debug!("skipping large file: {} ({} bytes)", entry.path, entry.size);
            return false;
        }
        if !self.should_include(&entry.path) {
            tracing::debug!("skipping file based on filters: {}", entry.path);
            return false;
        }
        true
    }
}
