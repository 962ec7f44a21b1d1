//! Shared types used across all modules.
//!
//! This module defines the core data structures for repository entries,
//! sections, repository statistics, and the analysis method selector.
//! Other modules import from here rather than reaching into each other's
//! internals.

pub mod entry;
pub mod section;
pub mod stats;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use entry::{EntryKind, RepoEntry, RepoFileMap};
pub use section::Section;
pub use stats::RepositoryStats;

/// How a file map is partitioned into sections.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisMethod {
    /// Group by directory path prefix.
    Structural,
    /// Group by reference-graph locality.
    #[default]
    Dependency,
    /// Structural seed, oversized sections refined by dependency clusters.
    Hybrid,
}

impl AnalysisMethod {
    /// All methods, in dispatch-table order.
    pub const ALL: [AnalysisMethod; 3] = [
        AnalysisMethod::Structural,
        AnalysisMethod::Dependency,
        AnalysisMethod::Hybrid,
    ];

    /// Whether this method consumes a dependency graph.
    pub fn uses_graph(self) -> bool {
        !matches!(self, AnalysisMethod::Structural)
    }
}

impl fmt::Display for AnalysisMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisMethod::Structural => write!(f, "structural"),
            AnalysisMethod::Dependency => write!(f, "dependency"),
            AnalysisMethod::Hybrid => write!(f, "hybrid"),
        }
    }
}

impl std::str::FromStr for AnalysisMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "structural" | "structure" => Ok(AnalysisMethod::Structural),
            "dependency" | "dependencies" => Ok(AnalysisMethod::Dependency),
            "hybrid" => Ok(AnalysisMethod::Hybrid),
            other => Err(format!(
                "unsupported analysis method: '{other}'. Supported: structural, dependency, hybrid"
            )),
        }
    }
}

/// Supported remote transport backends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendName {
    /// Direct GitHub REST API binding.
    #[default]
    GitHub,
    /// External CLI tool that proxies repository tool calls.
    Bridge,
}

impl fmt::Display for BackendName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendName::GitHub => write!(f, "github"),
            BackendName::Bridge => write!(f, "bridge"),
        }
    }
}

impl std::str::FromStr for BackendName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "github" => Ok(BackendName::GitHub),
            "bridge" | "mcp" => Ok(BackendName::Bridge),
            other => Err(format!(
                "unsupported backend: '{other}'. Supported: github, bridge"
            )),
        }
    }
}

/// Identifies one repository snapshot: the key for every cache record.
///
/// `branch` is kept as given by the caller; `None` means "whatever the
/// default branch is" and is cached under its own slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoKey {
    pub owner: String,
    pub repo: String,
    pub branch: Option<String>,
}

impl RepoKey {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>, branch: Option<&str>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
            branch: branch.map(str::to_string),
        }
    }
}

impl fmt::Display for RepoKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.branch {
            Some(branch) => write!(f, "{}/{}@{branch}", self.owner, self.repo),
            None => write!(f, "{}/{}", self.owner, self.repo),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_display_and_parse_agree() {
        for method in AnalysisMethod::ALL {
            assert_eq!(method.to_string().parse::<AnalysisMethod>().unwrap(), method);
        }
    }

    #[test]
    fn method_parse_is_case_insensitive() {
        assert_eq!("HYBRID".parse::<AnalysisMethod>().unwrap(), AnalysisMethod::Hybrid);
        assert_eq!(
            "Structure".parse::<AnalysisMethod>().unwrap(),
            AnalysisMethod::Structural
        );
    }

    #[test]
    fn method_parse_rejects_unknown() {
        let err = "random".parse::<AnalysisMethod>().unwrap_err();
        assert!(err.contains("unsupported analysis method"));
        assert!(err.contains("random"));
    }

    #[test]
    fn method_default_is_dependency() {
        assert_eq!(AnalysisMethod::default(), AnalysisMethod::Dependency);
        assert!(AnalysisMethod::Dependency.uses_graph());
        assert!(!AnalysisMethod::Structural.uses_graph());
    }

    #[test]
    fn method_serde_is_lowercase() {
        let json = serde_json::to_string(&AnalysisMethod::Hybrid).unwrap();
        assert_eq!(json, "\"hybrid\"");
    }

    #[test]
    fn backend_accepts_mcp_alias() {
        assert_eq!("mcp".parse::<BackendName>().unwrap(), BackendName::Bridge);
        assert_eq!("GitHub".parse::<BackendName>().unwrap(), BackendName::GitHub);
        assert!("gitlab".parse::<BackendName>().is_err());
    }

    #[test]
    fn repo_key_display() {
        assert_eq!(RepoKey::new("o", "r", Some("dev")).to_string(), "o/r@dev");
        assert_eq!(RepoKey::new("o", "r", None).to_string(), "o/r");
    }
}
