//! App-wide constants.
//!
//! Centralises the tool name, config paths, environment variable names,
//! and URLs so a rename only requires changing this file.

/// Display name of the tool (lowercase).
pub const APP_NAME: &str = "sectioner";

/// Crate version, baked in at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Local config filename (e.g. `.sectioner.toml` in the working directory).
pub const CONFIG_FILENAME: &str = ".sectioner.toml";

/// Directory name under `~/.config/` for global config and cache.
pub const CONFIG_DIR: &str = "sectioner";

/// Base URL of the GitHub REST API.
pub const GITHUB_API_URL: &str = "https://api.github.com";

/// Branch name used when the remote cannot tell us the default branch.
pub const FALLBACK_BRANCH: &str = "main";

/// Section name for files that live at the repository root.
pub const ROOT_SECTION: &str = "root";

// ── Environment variable names ──────────────────────────────────────

pub const ENV_GITHUB_TOKEN: &str = "GITHUB_TOKEN";
pub const ENV_TOKEN: &str = "SECTIONER_TOKEN";
pub const ENV_BACKEND: &str = "SECTIONER_BACKEND";
pub const ENV_METHOD: &str = "SECTIONER_METHOD";
pub const ENV_CACHE: &str = "SECTIONER_CACHE";
pub const ENV_LOG: &str = "SECTIONER_LOG";
