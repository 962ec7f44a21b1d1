//! Repository statistics reported by a remote backend.

use serde::{Deserialize, Serialize};

/// Repository metadata and counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryStats {
    pub name: String,
    pub full_name: String,
    pub description: Option<String>,
    pub default_branch: Option<String>,
    pub language: Option<String>,
    pub stars: u64,
    pub forks: u64,
    pub open_issues: u64,
    /// ISO-8601 timestamp as reported by the remote.
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub is_private: bool,
    pub is_archived: bool,
    pub license: Option<String>,
}

impl RepositoryStats {
    /// Build stats from a GitHub-shaped repository object.
    ///
    /// Both the REST API and the bridge return this shape, so the
    /// mapping lives here rather than in each backend.
    pub fn from_github_json(value: &serde_json::Value) -> Option<Self> {
        let obj = value.as_object()?;
        let text = |key: &str| obj.get(key).and_then(|v| v.as_str()).map(str::to_string);
        let count = |key: &str| obj.get(key).and_then(|v| v.as_u64()).unwrap_or(0);
        let flag = |key: &str| obj.get(key).and_then(|v| v.as_bool()).unwrap_or(false);

        Some(Self {
            name: text("name")?,
            full_name: text("full_name").unwrap_or_default(),
            description: text("description"),
            default_branch: text("default_branch"),
            language: text("language"),
            stars: count("stargazers_count"),
            forks: count("forks_count"),
            open_issues: count("open_issues_count"),
            created_at: text("created_at"),
            updated_at: text("updated_at"),
            is_private: flag("private"),
            is_archived: flag("archived"),
            license: obj
                .get("license")
                .and_then(|l| l.get("name"))
                .and_then(|n| n.as_str())
                .map(str::to_string),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_github_repository_object() {
        let value = serde_json::json!({
            "name": "widgets",
            "full_name": "acme/widgets",
            "description": "Widget factory",
            "default_branch": "trunk",
            "language": "Rust",
            "stargazers_count": 42,
            "forks_count": 7,
            "open_issues_count": 3,
            "created_at": "2020-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z",
            "private": false,
            "archived": true,
            "license": { "name": "MIT License" }
        });
        let stats = RepositoryStats::from_github_json(&value).unwrap();
        assert_eq!(stats.full_name, "acme/widgets");
        assert_eq!(stats.default_branch.as_deref(), Some("trunk"));
        assert_eq!(stats.stars, 42);
        assert!(stats.is_archived);
        assert_eq!(stats.license.as_deref(), Some("MIT License"));
    }

    #[test]
    fn missing_license_is_none() {
        let value = serde_json::json!({ "name": "x", "license": null });
        let stats = RepositoryStats::from_github_json(&value).unwrap();
        assert!(stats.license.is_none());
        assert_eq!(stats.stars, 0);
    }

    #[test]
    fn non_object_is_rejected() {
        assert!(RepositoryStats::from_github_json(&serde_json::json!([])).is_none());
    }
}
