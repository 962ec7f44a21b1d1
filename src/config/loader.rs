//! Config struct and loading logic.
//!
//! Priority (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables
//! 3. `.sectioner.toml` in the working directory
//! 4. `~/.config/sectioner/config.toml` (global defaults)
//! 5. Built-in defaults

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::env::Env;
use crate::models::{AnalysisMethod, BackendName};

/// Errors during config loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    ParseFile {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub traversal: TraversalConfig,
    pub fetch: FetchConfig,
    pub sections: SectionConfig,
    pub remote: RemoteConfig,
    pub cache: CacheConfig,
}

/// Which repository entries are considered for fetching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraversalConfig {
    /// Any path containing one of these substrings is skipped.
    pub ignore_dirs: Vec<String>,
    /// Suffixes skipped when no extension allow-list is configured.
    pub binary_extensions: Vec<String>,
    /// Files larger than this many bytes are skipped.
    pub max_file_size: u64,
    /// Extension allow-list; empty means "everything but binaries".
    pub extensions: Vec<String>,
    /// Substrings that include a path even when its extension is not allowed.
    pub include_patterns: Vec<String>,
}

impl Default for TraversalConfig {
    fn default() -> Self {
        Self {
            ignore_dirs: [".git", "node_modules", "__pycache__", "dist", "build"]
                .map(String::from)
                .to_vec(),
            binary_extensions: [
                ".png", ".jpg", ".jpeg", ".gif", ".bmp", ".pdf", ".zip", ".gz", ".tar", ".class",
                ".exe", ".dll", ".so",
            ]
            .map(String::from)
            .to_vec(),
            max_file_size: 500_000,
            extensions: Vec::new(),
            include_patterns: Vec::new(),
        }
    }
}

/// Batched content fetching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Files per sequential batch.
    pub batch_size: usize,
    /// Concurrent fetches within one batch.
    pub max_workers: usize,
    /// Ignore a cached file map and re-fetch.
    pub force_refresh: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            batch_size: 10,
            max_workers: 5,
            force_refresh: false,
        }
    }
}

/// Section partitioning bounds and method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SectionConfig {
    pub method: AnalysisMethod,
    /// Sections with more files than this are subdivided.
    pub max_section_size: usize,
    /// Sections with fewer files than this are merged into a neighbour.
    pub min_section_size: usize,
}

impl Default for SectionConfig {
    fn default() -> Self {
        Self {
            method: AnalysisMethod::Dependency,
            max_section_size: 15,
            min_section_size: 2,
        }
    }
}

/// Remote backend configuration.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    pub backend: BackendName,
    pub token: Option<String>,
    pub api_url: String,
    /// Branch used when default-branch lookup fails.
    pub fallback_branch: String,
    /// Whether the backend supports reference search. `None` uses the
    /// backend's own default (bridge: yes, github: no).
    pub search: Option<bool>,
    /// Cap on search results per reference lookup.
    pub search_max_results: usize,
    /// Executable invoked by the bridge backend.
    pub bridge_executable: String,
    /// Time bound for a single bridged call.
    pub timeout_secs: u64,
}

impl std::fmt::Debug for RemoteConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteConfig")
            .field("backend", &self.backend)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("api_url", &self.api_url)
            .field("fallback_branch", &self.fallback_branch)
            .field("search", &self.search)
            .field("search_max_results", &self.search_max_results)
            .field("bridge_executable", &self.bridge_executable)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            backend: BackendName::GitHub,
            token: None,
            api_url: crate::constants::GITHUB_API_URL.to_string(),
            fallback_branch: crate::constants::FALLBACK_BRANCH.to_string(),
            search: None,
            search_max_results: 100,
            bridge_executable: "claude".to_string(),
            timeout_secs: 180,
        }
    }
}

impl RemoteConfig {
    /// Resolve the search capability flag for the configured backend.
    pub fn search_enabled(&self) -> bool {
        self.search.unwrap_or(self.backend == BackendName::Bridge)
    }
}

/// Result cache configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    /// Override for the cache directory (default `~/.config/sectioner/cache`).
    pub dir: Option<PathBuf>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: None,
        }
    }
}

impl Config {
    /// Load configuration with proper layering.
    ///
    /// Reads from global config, local config, then applies
    /// environment variable overrides.
    pub fn load(work_dir: Option<&Path>, env: &Env) -> Result<Self, ConfigError> {
        let mut config = Config::default();

        // Layer 4: global config
        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                let global = Self::load_file(&global_path)?;
                config.merge(global);
            }
        }

        // Layer 3: local config
        if let Some(root) = work_dir {
            let local_path = root.join(crate::constants::CONFIG_FILENAME);
            if local_path.exists() {
                let local = Self::load_file(&local_path)?;
                config.merge(local);
            }
        }

        // Layer 2: environment variables
        config.apply_env_vars(env);

        Ok(config)
    }

    /// Load a config from a specific file.
    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::ParseFile {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Get the global config file path.
    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(crate::constants::CONFIG_DIR).join("config.toml"))
    }

    /// Merge another config into this one (other takes precedence for non-default values).
    fn merge(&mut self, other: Config) {
        // Traversal settings
        let default_traversal = TraversalConfig::default();
        if other.traversal.ignore_dirs != default_traversal.ignore_dirs {
            self.traversal.ignore_dirs = other.traversal.ignore_dirs;
        }
        if other.traversal.binary_extensions != default_traversal.binary_extensions {
            self.traversal.binary_extensions = other.traversal.binary_extensions;
        }
        if other.traversal.max_file_size != default_traversal.max_file_size {
            self.traversal.max_file_size = other.traversal.max_file_size;
        }
        if !other.traversal.extensions.is_empty() {
            self.traversal.extensions = other.traversal.extensions;
        }
        if !other.traversal.include_patterns.is_empty() {
            self.traversal.include_patterns = other.traversal.include_patterns;
        }

        // Fetch settings
        let default_fetch = FetchConfig::default();
        if other.fetch.batch_size != default_fetch.batch_size {
            self.fetch.batch_size = other.fetch.batch_size;
        }
        if other.fetch.max_workers != default_fetch.max_workers {
            self.fetch.max_workers = other.fetch.max_workers;
        }
        if other.fetch.force_refresh {
            self.fetch.force_refresh = true;
        }

        // Section settings
        let default_sections = SectionConfig::default();
        if other.sections.method != default_sections.method {
            self.sections.method = other.sections.method;
        }
        if other.sections.max_section_size != default_sections.max_section_size {
            self.sections.max_section_size = other.sections.max_section_size;
        }
        if other.sections.min_section_size != default_sections.min_section_size {
            self.sections.min_section_size = other.sections.min_section_size;
        }

        // Remote settings
        let default_remote = RemoteConfig::default();
        if other.remote.backend != default_remote.backend {
            self.remote.backend = other.remote.backend;
        }
        if other.remote.token.is_some() {
            self.remote.token = other.remote.token;
        }
        if other.remote.api_url != default_remote.api_url {
            self.remote.api_url = other.remote.api_url;
        }
        if other.remote.fallback_branch != default_remote.fallback_branch {
            self.remote.fallback_branch = other.remote.fallback_branch;
        }
        if other.remote.search.is_some() {
            self.remote.search = other.remote.search;
        }
        if other.remote.search_max_results != default_remote.search_max_results {
            self.remote.search_max_results = other.remote.search_max_results;
        }
        if other.remote.bridge_executable != default_remote.bridge_executable {
            self.remote.bridge_executable = other.remote.bridge_executable;
        }
        if other.remote.timeout_secs != default_remote.timeout_secs {
            self.remote.timeout_secs = other.remote.timeout_secs;
        }

        // Cache settings (disabled overrides enabled)
        if !other.cache.enabled {
            self.cache.enabled = false;
        }
        if other.cache.dir.is_some() {
            self.cache.dir = other.cache.dir;
        }
    }

    /// Apply environment variable overrides.
    fn apply_env_vars(&mut self, env: &Env) {
        use crate::constants::{ENV_BACKEND, ENV_CACHE, ENV_GITHUB_TOKEN, ENV_METHOD, ENV_TOKEN};

        if let Some(val) = env.value(ENV_BACKEND) {
            match val.parse::<BackendName>() {
                Ok(backend) => self.remote.backend = backend,
                Err(_) => tracing::warn!("ignoring invalid {ENV_BACKEND} value: {val}"),
            }
        }
        if let Some(val) = env.value(ENV_METHOD) {
            match val.parse::<AnalysisMethod>() {
                Ok(method) => self.sections.method = method,
                Err(_) => tracing::warn!("ignoring invalid {ENV_METHOD} value: {val}"),
            }
        }

        let token = env.value(ENV_TOKEN).or_else(|| env.value(ENV_GITHUB_TOKEN));
        if token.is_some() {
            self.remote.token = token;
        }

        if env.is_set(ENV_CACHE) {
            match env.flag(ENV_CACHE) {
                Some(enabled) => self.cache.enabled = enabled,
                None => tracing::warn!("ignoring invalid {ENV_CACHE} value"),
            }
        }
    }
}
