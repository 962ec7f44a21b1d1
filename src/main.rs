//! sectioner: partition remote repositories into bounded sections.
//!
//! Entry point and error handling boundary. Uses `anyhow` for
//! ergonomic error propagation and user-facing messages.

mod cli;

use sectioner::cache;
use sectioner::config;
use sectioner::constants;
use sectioner::env;
use sectioner::orchestrator;
use sectioner::output;
use sectioner::remote;

use std::process;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::args::{AnalyzeArgs, CacheAction, Cli, Command, StatsArgs};
use config::Config;
use env::Env;

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("Error: {err:#}");
        process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Analyze(args) => run_analyze(*args).await,
        Command::Stats(args) => run_stats(args).await,
        Command::Cache { action } => run_cache(action).await,
        Command::Version => {
            println!("{} {}", constants::APP_NAME, constants::VERSION);
            Ok(())
        }
    }
}

/// Install the stderr subscriber. `SECTIONER_LOG` wins over `-v`.
fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "sectioner=info,warn",
        1 => "sectioner=debug,info",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_env(constants::ENV_LOG).unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .ok();
}

fn load_config() -> Result<Config> {
    let cwd = std::env::current_dir().context("failed to determine working directory")?;
    Config::load(Some(&cwd), &Env::real()).context("failed to load configuration")
}

/// Fetch a repository, partition it, and print the sections.
async fn run_analyze(args: AnalyzeArgs) -> Result<()> {
    let mut config = load_config()?;
    args.apply(&mut config);
    tracing::debug!("effective configuration: {config:?}");

    let client = remote::build_client(&config.remote).context("failed to initialise remote backend")?;
    let cache = cache::CacheEngine::from_config(&config.cache);
    let analyzer = orchestrator::SectionAnalyzer::new(client, &config, cache);

    let repo = &args.repository;
    let analysis = analyzer
        .run(&repo.owner, &repo.repo, args.branch.as_deref(), None)
        .await
        .with_context(|| format!("failed to analyse {repo}"))?;

    let repository = repo.to_string();
    let report = output::AnalysisReport {
        repository: &repository,
        branch: analysis.report.branch.as_deref().or(args.branch.as_deref()),
        method: config.sections.method,
        sections: &analysis.sections,
        fetch: &analysis.report,
    };
    print!("{}", args.format.render(&report));

    if analysis.sections.is_empty() {
        bail!("no files could be retrieved from {repo}");
    }
    Ok(())
}

/// Print repository metadata.
async fn run_stats(args: StatsArgs) -> Result<()> {
    let mut config = load_config()?;
    if let Some(backend) = args.backend {
        config.remote.backend = backend;
    }

    let client = remote::build_client(&config.remote).context("failed to initialise remote backend")?;
    let analyzer = orchestrator::SectionAnalyzer::new(client, &config, cache::CacheEngine::disabled());

    let repo = &args.repository;
    let stats = analyzer
        .repository_stats(&repo.owner, &repo.repo)
        .await
        .with_context(|| format!("failed to read statistics for {repo}"))?;

    match stats {
        Some(stats) => {
            println!("{}", args.format.render_stats(&stats));
            Ok(())
        }
        None => bail!("the {} backend does not provide repository statistics", config.remote.backend),
    }
}

/// Manage the repository cache.
async fn run_cache(action: CacheAction) -> Result<()> {
    let config = load_config()?;
    let engine = cache::CacheEngine::from_config(&config.cache);

    match action {
        CacheAction::Clear => {
            let stats = engine.clear().context("failed to clear cache")?;
            println!(
                "Cleared {} cached repository/repositories ({} entries, {}).",
                stats.repositories,
                stats.entries,
                stats.human_size(),
            );
        }
        CacheAction::Stats => {
            let stats = engine.stats().context("failed to read cache stats")?;
            println!("Cached repositories: {}", stats.repositories);
            println!("Cache entries:       {}", stats.entries);
            println!("Cache size:          {}", stats.human_size());
        }
        CacheAction::Path => match engine.path() {
            Some(p) => println!("{}", p.display()),
            None => bail!("cache directory could not be determined"),
        },
    }

    Ok(())
}
