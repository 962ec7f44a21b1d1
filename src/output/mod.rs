//! Output renderers: terminal and JSON.

pub mod json;
pub mod terminal;

use serde::Serialize;

use crate::models::{AnalysisMethod, RepositoryStats, Section};
use crate::traversal::FetchReport;

/// Everything printed for one analysed repository.
#[derive(Debug, Clone, Copy)]
pub struct AnalysisReport<'a> {
    /// `owner/repo`.
    pub repository: &'a str,
    pub branch: Option<&'a str>,
    pub method: AnalysisMethod,
    pub sections: &'a [Section],
    pub fetch: &'a FetchReport,
}

/// Aggregate counts over a section set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub sections: usize,
    pub files: usize,
    pub largest: usize,
    pub smallest: usize,
}

impl Summary {
    pub fn from_sections(sections: &[Section]) -> Self {
        Self {
            sections: sections.len(),
            files: sections.iter().map(Section::len).sum(),
            largest: sections.iter().map(Section::len).max().unwrap_or(0),
            smallest: sections.iter().map(Section::len).min().unwrap_or(0),
        }
    }
}

/// Trait for rendering analysis results to an output format.
pub trait OutputRenderer {
    /// Render a partitioned repository.
    fn render(&self, report: &AnalysisReport<'_>) -> String;

    /// Render repository metadata.
    fn render_stats(&self, stats: &RepositoryStats) -> String;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn section(name: &str, n: usize) -> Section {
        let files: BTreeMap<String, String> = (0..n).map(|i| (format!("{name}/{i}"), String::new())).collect();
        Section::new(name, files)
    }

    #[test]
    fn summary_counts() {
        let summary = Summary::from_sections(&[section("a", 3), section("b", 1), section("c", 5)]);
        assert_eq!(
            summary,
            Summary {
                sections: 3,
                files: 9,
                largest: 5,
                smallest: 1,
            }
        );
    }

    #[test]
    fn summary_of_nothing() {
        assert_eq!(Summary::from_sections(&[]), Summary::default());
    }
}
