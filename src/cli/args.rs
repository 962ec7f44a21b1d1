//! Clap argument types and config overrides.

use clap::{ArgAction, Parser, ValueEnum};

use sectioner::config::Config;
use sectioner::models::{AnalysisMethod, BackendName, RepositoryStats};
use sectioner::output::{AnalysisReport, OutputRenderer};

/// Partition remote repositories into bounded sections for summarization.
#[derive(Parser, Debug)]
#[command(name = "sectioner", version = sectioner::constants::VERSION)]
pub struct Cli {
    /// Increase log verbosity (-v debug, -vv trace). `SECTIONER_LOG` overrides.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(clap::Subcommand, Debug)]
pub enum Command {
    /// Fetch a repository and print its sections.
    Analyze(Box<AnalyzeArgs>),

    /// Show repository metadata.
    Stats(StatsArgs),

    /// Manage the repository cache.
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// Print version information.
    Version,
}

/// A repository given as `owner/repo`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub owner: String,
    pub repo: String,
}

impl std::fmt::Display for RepoRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// Parse `owner/repo`, tolerating a `https://github.com/` prefix and a `.git` suffix.
pub fn parse_repository(value: &str) -> Result<RepoRef, String> {
    let trimmed = value
        .trim()
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .trim_start_matches("github.com/")
        .trim_end_matches('/')
        .trim_end_matches(".git");
    match trimmed.split_once('/') {
        Some((owner, repo)) if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') => Ok(RepoRef {
            owner: owner.to_string(),
            repo: repo.to_string(),
        }),
        _ => Err(format!("expected OWNER/REPO, got '{value}'")),
    }
}

/// Arguments for the `analyze` subcommand.
#[derive(Parser, Debug)]
pub struct AnalyzeArgs {
    /// Repository to analyse, as OWNER/REPO.
    #[arg(value_parser = parse_repository)]
    pub repository: RepoRef,

    /// Branch to read (default: the repository's default branch).
    #[arg(long, short)]
    pub branch: Option<String>,

    // --- Partitioning ---
    /// Partitioning method: structural, dependency, or hybrid.
    #[arg(long, short)]
    pub method: Option<AnalysisMethod>,

    /// Sections with more files than this are subdivided.
    #[arg(long)]
    pub max_section_size: Option<usize>,

    /// Sections with fewer files than this are merged into a neighbour.
    #[arg(long)]
    pub min_section_size: Option<usize>,

    // --- Traversal ---
    /// Comma-separated extension allow-list (e.g. `.py,.rs`).
    #[arg(long = "extension", value_delimiter = ',')]
    pub extensions: Vec<String>,

    /// Comma-separated path substrings included regardless of extension.
    #[arg(long = "include", value_delimiter = ',')]
    pub include_patterns: Vec<String>,

    /// Skip files larger than this many bytes.
    #[arg(long)]
    pub max_file_size: Option<u64>,

    // --- Remote ---
    /// Remote backend: github or bridge.
    #[arg(long)]
    pub backend: Option<BackendName>,

    /// Max concurrent fetches per batch.
    #[arg(long)]
    pub max_workers: Option<usize>,

    /// Files per fetch batch.
    #[arg(long)]
    pub batch_size: Option<usize>,

    // --- Cache ---
    /// Disable the repository cache.
    #[arg(long, default_value_t = false)]
    pub no_cache: bool,

    /// Ignore a cached file map and fetch again.
    #[arg(long, default_value_t = false)]
    pub force_refresh: bool,

    // --- Output ---
    /// Output format.
    #[arg(long, default_value = "terminal")]
    pub format: OutputFormat,
}

impl AnalyzeArgs {
    /// Apply command-line overrides on top of the loaded config.
    pub fn apply(&self, config: &mut Config) {
        if let Some(method) = self.method {
            config.sections.method = method;
        }
        if let Some(max) = self.max_section_size {
            config.sections.max_section_size = max;
        }
        if let Some(min) = self.min_section_size {
            config.sections.min_section_size = min;
        }
        if !self.extensions.is_empty() {
            config.traversal.extensions = self.extensions.clone();
        }
        if !self.include_patterns.is_empty() {
            config.traversal.include_patterns = self.include_patterns.clone();
        }
        if let Some(size) = self.max_file_size {
            config.traversal.max_file_size = size;
        }
        if let Some(backend) = self.backend {
            config.remote.backend = backend;
        }
        if let Some(workers) = self.max_workers {
            config.fetch.max_workers = workers;
        }
        if let Some(batch) = self.batch_size {
            config.fetch.batch_size = batch;
        }
        if self.no_cache {
            config.cache.enabled = false;
        }
        if self.force_refresh {
            config.fetch.force_refresh = true;
        }
    }
}

/// Arguments for the `stats` subcommand.
#[derive(Parser, Debug)]
pub struct StatsArgs {
    /// Repository, as OWNER/REPO.
    #[arg(value_parser = parse_repository)]
    pub repository: RepoRef,

    /// Remote backend: github or bridge.
    #[arg(long)]
    pub backend: Option<BackendName>,

    /// Output format.
    #[arg(long, default_value = "terminal")]
    pub format: OutputFormat,
}

/// Cache management subcommands.
#[derive(clap::Subcommand, Debug)]
pub enum CacheAction {
    /// Remove all cached repositories.
    Clear,
    /// Show cache statistics (repositories, entries, size).
    Stats,
    /// Print the cache directory path.
    Path,
}

/// Output format options.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    Terminal,
    Json,
}

impl OutputFormat {
    fn renderer(&self) -> &'static dyn OutputRenderer {
        match self {
            OutputFormat::Terminal => &sectioner::output::terminal::TerminalRenderer,
            OutputFormat::Json => &sectioner::output::json::JsonRenderer,
        }
    }

    /// Render sections using the renderer for this format.
    pub fn render(&self, report: &AnalysisReport<'_>) -> String {
        self.renderer().render(report)
    }

    /// Render repository metadata using the renderer for this format.
    pub fn render_stats(&self, stats: &RepositoryStats) -> String {
        self.renderer().render_stats(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyze(args: &[&str]) -> AnalyzeArgs {
        let cli = Cli::try_parse_from(std::iter::once("sectioner").chain(args.iter().copied())).unwrap();
        match cli.command {
            Command::Analyze(args) => *args,
            other => panic!("expected analyze, got {other:?}"),
        }
    }

    #[test]
    fn parse_owner_repo() {
        assert_eq!(
            parse_repository("octo/widgets").unwrap(),
            RepoRef {
                owner: "octo".into(),
                repo: "widgets".into()
            }
        );
    }

    #[test]
    fn parse_github_url() {
        let r = parse_repository("https://github.com/octo/widgets.git").unwrap();
        assert_eq!(r.to_string(), "octo/widgets");
    }

    #[test]
    fn parse_rejects_malformed() {
        assert!(parse_repository("widgets").is_err());
        assert!(parse_repository("/widgets").is_err());
        assert!(parse_repository("a/b/c").is_err());
    }

    #[test]
    fn analyze_defaults() {
        let args = analyze(&["analyze", "octo/widgets"]);
        assert_eq!(args.repository.owner, "octo");
        assert!(args.branch.is_none());
        assert!(args.method.is_none());
        assert_eq!(args.format, OutputFormat::Terminal);
        assert!(!args.no_cache);
    }

    #[test]
    fn analyze_flags_override_config() {
        let args = analyze(&[
            "analyze",
            "octo/widgets",
            "--method",
            "hybrid",
            "--max-section-size",
            "8",
            "--min-section-size",
            "3",
            "--extension",
            ".py,.rs",
            "--include",
            "README",
            "--backend",
            "bridge",
            "--no-cache",
            "--force-refresh",
        ]);
        let mut config = Config::default();
        args.apply(&mut config);

        assert_eq!(config.sections.method, AnalysisMethod::Hybrid);
        assert_eq!(config.sections.max_section_size, 8);
        assert_eq!(config.sections.min_section_size, 3);
        assert_eq!(config.traversal.extensions, vec![".py", ".rs"]);
        assert_eq!(config.traversal.include_patterns, vec!["README"]);
        assert_eq!(config.remote.backend, BackendName::Bridge);
        assert!(!config.cache.enabled);
        assert!(config.fetch.force_refresh);
    }

    #[test]
    fn absent_flags_leave_config_untouched() {
        let args = analyze(&["analyze", "o/r"]);
        let mut config = Config::default();
        args.apply(&mut config);
        assert_eq!(config.sections, Config::default().sections);
        assert_eq!(config.traversal, Config::default().traversal);
    }

    #[test]
    fn unknown_method_is_rejected() {
        let result = Cli::try_parse_from(["sectioner", "analyze", "o/r", "--method", "random"]);
        assert!(result.is_err());
    }

    #[test]
    fn verbose_is_global() {
        let cli = Cli::try_parse_from(["sectioner", "analyze", "o/r", "-vv"]).unwrap();
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn cache_subcommands() {
        let cli = Cli::try_parse_from(["sectioner", "cache", "stats"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Cache {
                action: CacheAction::Stats
            }
        ));
    }

    #[test]
    fn stats_command_json() {
        let cli = Cli::try_parse_from(["sectioner", "stats", "octo/widgets", "--format", "json"]).unwrap();
        match cli.command {
            Command::Stats(args) => {
                assert_eq!(args.repository.repo, "widgets");
                assert_eq!(args.format, OutputFormat::Json);
            }
            other => panic!("expected stats, got {other:?}"),
        }
    }
}
