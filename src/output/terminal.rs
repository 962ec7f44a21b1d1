//! Terminal renderer: styled flowing text, one block per section.

use colored::Colorize;

use crate::models::RepositoryStats;
use crate::output::{AnalysisReport, OutputRenderer, Summary};

/// Terminal output renderer with colored, flowing text.
pub struct TerminalRenderer;

impl OutputRenderer for TerminalRenderer {
    fn render(&self, report: &AnalysisReport<'_>) -> String {
        let mut output = String::new();

        let branch = report.branch.unwrap_or("default branch");
        output.push_str(&format!(
            " {} {} {}\n",
            report.repository.bold(),
            format!("@ {branch}").dimmed(),
            format!("({} analysis)", report.method).dimmed(),
        ));
        if report.fetch.from_cache {
            output.push_str(&format!("   {}\n", "file map loaded from cache".dimmed()));
        } else if report.fetch.failed > 0 {
            output.push_str(&format!(
                "   {} {} of {} files could not be fetched\n",
                "⚠".yellow().bold(),
                report.fetch.failed,
                report.fetch.candidates,
            ));
        }
        output.push('\n');

        if report.sections.is_empty() {
            output.push_str(&format!("{}", "  ✔ No files to section.\n".green()));
            return output;
        }

        for section in report.sections {
            output.push_str(&format!(
                " {} {} {}\n",
                "■".cyan().bold(),
                section.name.bold(),
                format!("({} {})", section.len(), plural(section.len(), "file", "files")).dimmed(),
            ));
            for path in section.paths() {
                output.push_str(&format!("   {path}\n"));
            }
            output.push('\n');
        }

        let summary = Summary::from_sections(report.sections);
        output.push_str(&format!("{}\n", "───────────────────────────────────".dimmed()));
        output.push_str(&format!(
            " {} {}, {} {} (largest {}, smallest {})\n",
            summary.sections.to_string().bold(),
            plural(summary.sections, "section", "sections"),
            summary.files.to_string().bold(),
            plural(summary.files, "file", "files"),
            summary.largest,
            summary.smallest,
        ));

        output
    }

    fn render_stats(&self, stats: &RepositoryStats) -> String {
        let mut output = format!(" {}\n", stats.full_name.bold());
        if let Some(ref description) = stats.description {
            output.push_str(&format!("   {}\n", description.dimmed()));
        }
        output.push('\n');

        let mut row = |label: &str, value: String| {
            output.push_str(&format!("   {} {}\n", format!("{label}:").cyan(), value));
        };
        row("language", stats.language.clone().unwrap_or_else(|| "-".to_string()));
        row("default branch", stats.default_branch.clone().unwrap_or_else(|| "-".to_string()));
        row("stars", stats.stars.to_string());
        row("forks", stats.forks.to_string());
        row("open issues", stats.open_issues.to_string());
        row("license", stats.license.clone().unwrap_or_else(|| "-".to_string()));
        if let Some(ref created) = stats.created_at {
            row("created", created.clone());
        }
        if let Some(ref updated) = stats.updated_at {
            row("updated", updated.clone());
        }
        if stats.is_private {
            row("visibility", "private".to_string());
        }
        if stats.is_archived {
            row("archived", "yes".to_string());
        }

        output
    }
}

fn plural<'a>(n: usize, one: &'a str, many: &'a str) -> &'a str {
    if n == 1 { one } else { many }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AnalysisMethod, Section};
    use crate::traversal::FetchReport;
    use std::collections::BTreeMap;

    fn sections() -> Vec<Section> {
        let files = |paths: &[&str]| -> BTreeMap<String, String> {
            paths.iter().map(|p| (p.to_string(), String::new())).collect()
        };
        vec![
            Section::new("src", files(&["src/lib.rs", "src/main.rs"])),
            Section::new("docs", files(&["docs/guide.md"])),
        ]
    }

    #[test]
    fn render_sections() {
        let sections = sections();
        let fetch = FetchReport::default();
        let report = AnalysisReport {
            repository: "octo/widgets",
            branch: Some("main"),
            method: AnalysisMethod::Structural,
            sections: &sections,
            fetch: &fetch,
        };
        let output = TerminalRenderer.render(&report);
        // may be wrapped in ANSI color codes
        assert!(output.contains("octo/widgets"));
        assert!(output.contains("structural analysis"));
        assert!(output.contains("src/main.rs"));
        assert!(output.contains("docs/guide.md"));
        assert!(output.contains("sections"));
    }

    #[test]
    fn render_empty() {
        let fetch = FetchReport::default();
        let report = AnalysisReport {
            repository: "octo/empty",
            branch: None,
            method: AnalysisMethod::Dependency,
            sections: &[],
            fetch: &fetch,
        };
        let output = TerminalRenderer.render(&report);
        assert!(output.contains("No files to section"));
        assert!(output.contains("default branch"));
    }

    #[test]
    fn render_reports_failed_fetches() {
        let sections = sections();
        let fetch = FetchReport {
            branch: Some("main".into()),
            candidates: 5,
            fetched: 3,
            failed: 2,
            from_cache: false,
        };
        let report = AnalysisReport {
            repository: "o/r",
            branch: Some("main"),
            method: AnalysisMethod::Hybrid,
            sections: &sections,
            fetch: &fetch,
        };
        assert!(TerminalRenderer.render(&report).contains("2 of 5 files could not be fetched"));
    }

    #[test]
    fn render_stats_rows() {
        let stats = RepositoryStats {
            full_name: "octo/widgets".into(),
            language: Some("Rust".into()),
            stars: 42,
            is_archived: true,
            ..RepositoryStats::default()
        };
        let output = TerminalRenderer.render_stats(&stats);
        assert!(output.contains("octo/widgets"));
        assert!(output.contains("Rust"));
        assert!(output.contains("42"));
        assert!(output.contains("archived"));
    }
}
