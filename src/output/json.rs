//! JSON output renderer.
//!
//! Outputs `{"repository": ..., "sections": [...], "summary": {...}}` format.

use crate::models::RepositoryStats;
use crate::output::{AnalysisReport, OutputRenderer, Summary};

/// JSON output renderer.
pub struct JsonRenderer;

impl OutputRenderer for JsonRenderer {
    fn render(&self, report: &AnalysisReport<'_>) -> String {
        let sections: Vec<_> = report
            .sections
            .iter()
            .map(|s| {
                serde_json::json!({
                    "name": s.name,
                    "files": s.paths().collect::<Vec<_>>(),
                })
            })
            .collect();

        let output = serde_json::json!({
            "repository": report.repository,
            "branch": report.branch,
            "method": report.method,
            "from_cache": report.fetch.from_cache,
            "failed_fetches": report.fetch.failed,
            "sections": sections,
            "summary": Summary::from_sections(report.sections),
        });

        serde_json::to_string_pretty(&output).unwrap_or_else(|_| "{}".to_string())
    }

    fn render_stats(&self, stats: &RepositoryStats) -> String {
        serde_json::to_string_pretty(stats).unwrap_or_else(|_| "{}".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AnalysisMethod, Section};
    use crate::traversal::FetchReport;
    use std::collections::BTreeMap;

    #[test]
    fn render_json() {
        let files: BTreeMap<String, String> = [("src/a.rs", "fn a() {}"), ("src/b.rs", "fn b() {}")]
            .into_iter()
            .map(|(p, c)| (p.to_string(), c.to_string()))
            .collect();
        let sections = vec![Section::new("src", files)];
        let fetch = FetchReport::default();
        let report = AnalysisReport {
            repository: "octo/widgets",
            branch: Some("dev"),
            method: AnalysisMethod::Dependency,
            sections: &sections,
            fetch: &fetch,
        };

        let output = JsonRenderer.render(&report);
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(parsed["method"], "dependency");
        assert_eq!(parsed["branch"], "dev");
        assert_eq!(parsed["sections"][0]["name"], "src");
        assert_eq!(parsed["sections"][0]["files"].as_array().unwrap().len(), 2);
        assert_eq!(parsed["summary"]["files"], 2);
        // content is not part of the output
        assert!(!output.contains("fn a()"));
    }

    #[test]
    fn render_empty_json() {
        let fetch = FetchReport::default();
        let report = AnalysisReport {
            repository: "o/r",
            branch: None,
            method: AnalysisMethod::Structural,
            sections: &[],
            fetch: &fetch,
        };
        let parsed: serde_json::Value = serde_json::from_str(&JsonRenderer.render(&report)).unwrap();
        assert_eq!(parsed["sections"].as_array().unwrap().len(), 0);
        assert!(parsed["branch"].is_null());
        assert_eq!(parsed["summary"]["sections"], 0);
    }

    #[test]
    fn render_stats_json() {
        let stats = RepositoryStats {
            full_name: "octo/widgets".into(),
            stars: 7,
            ..RepositoryStats::default()
        };
        let parsed: serde_json::Value = serde_json::from_str(&JsonRenderer.render_stats(&stats)).unwrap();
        assert_eq!(parsed["full_name"], "octo/widgets");
        assert_eq!(parsed["stars"], 7);
    }
}
