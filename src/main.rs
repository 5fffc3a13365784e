//! Landing Crawler main entry point
//!
//! This is the command-line interface for the landing-zone corpus crawler.

use anyhow::Context;
use clap::Parser;
use landing_crawler::config::{load_config_with_hash, Config};
use landing_crawler::crawler::{run_crawl, Coordinator, Launcher};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Landing Crawler: a breadth-first corpus crawler
///
/// Crawls each configured root URL to a bounded depth, stores every PDF and
/// HTML page it finds in the landing zone and records each fetch attempt in
/// a shared JSON journal.
#[derive(Parser, Debug)]
#[command(name = "landing-crawler")]
#[command(version)]
#[command(about = "A breadth-first corpus crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Skip URLs already recorded in the journal
    #[arg(long, conflicts_with = "fresh")]
    resume: bool,

    /// Refetch everything, ignoring the journal
    #[arg(long, conflicts_with = "resume")]
    fresh: bool,

    /// Run every root in this process instead of one process per root
    #[arg(long)]
    in_process: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with_all = ["stats", "worker_root"])]
    dry_run: bool,

    /// Show statistics from the journal and exit
    #[arg(long, conflicts_with_all = ["dry_run", "worker_root"])]
    stats: bool,

    /// Crawl a single root and print its summary as JSON (used by the pool)
    #[arg(long, value_name = "URL", hide = true)]
    worker_root: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::debug!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.resume {
        config.crawler.resume = true;
    } else if cli.fresh {
        config.crawler.resume = false;
    }

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config)?;
    } else if let Some(root_url) = cli.worker_root.as_deref() {
        handle_worker(config, root_url).await?;
    } else {
        handle_crawl(config, &cli).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Logs go to stderr; stdout carries worker summaries.
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("landing_crawler=info,warn"),
            1 => EnvFilter::new("landing_crawler=debug,info"),
            2 => EnvFilter::new("landing_crawler=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: shows what would be crawled
fn handle_dry_run(config: &Config) {
    println!("=== Landing Crawler Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Max depth: {}", config.crawler.max_depth);
    println!("  Workers: {}", config.crawler.workers);
    println!("  Resume from journal: {}", config.crawler.resume);

    println!("\nFetcher:");
    println!("  Max attempts: {}", config.fetcher.max_attempts);
    println!("  Backoff factor: {}s", config.fetcher.backoff_factor);
    println!("  Retry statuses: {:?}", config.fetcher.retry_statuses);
    println!("  Timeout: {}s", config.fetcher.timeout_secs);
    println!("  User agent: {}", config.fetcher.user_agent);

    let zone = &config.landing_zone;
    println!("\nLanding Zone:");
    println!("  Journal: {}", zone.metadata_path().display());
    println!("  Documents: {}", zone.documents_path().display());
    println!("  HTML: {}", zone.html_path().display());
    if let Some(content) = zone.content_path() {
        println!("  Cleaned content: {}", content.display());
    }
    if let Some(report) = zone.report_path() {
        println!("  Reports: {}", report.display());
    }

    println!("\nRoot URLs ({}):", config.crawler.roots.len());
    for root in &config.crawler.roots {
        println!("  - {}", root);
    }

    println!("\nBlocklist ({}):", config.crawler.blocklist.len());
    for pattern in &config.crawler.blocklist {
        println!("  - {}", pattern);
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the --stats mode: shows statistics from the journal
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    use landing_crawler::output::{load_statistics, print_statistics};
    use landing_crawler::storage::Journal;

    let journal = Journal::open(&config.landing_zone)?;
    println!("Journal: {}\n", journal.path().display());

    let stats = load_statistics(&journal)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the hidden worker mode: crawls one root, prints its summary
async fn handle_worker(config: Config, root_url: &str) -> anyhow::Result<()> {
    let coordinator = Coordinator::new(Arc::new(config))?;
    let summary = coordinator
        .crawl(root_url)
        .await
        .with_context(|| format!("Crawl of {} failed", root_url))?;

    println!("{}", serde_json::to_string(&summary)?);
    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, cli: &Cli) -> anyhow::Result<()> {
    if config.crawler.resume {
        tracing::info!("Starting crawl (skipping URLs already in the journal)");
    } else {
        tracing::info!("Starting fresh crawl");
    }

    let launcher = if cli.in_process {
        Launcher::InProcess(Arc::new(Coordinator::new(Arc::new(config.clone()))?))
    } else {
        Launcher::current_exe(
            cli.config.clone(),
            config.crawler.resume,
            cli.verbose,
            cli.quiet,
        )?
    };

    let report = run_crawl(&config, launcher).await;
    if !report.is_success() {
        anyhow::bail!(
            "{} of {} roots failed",
            report.failed(),
            report.roots.len()
        );
    }

    tracing::info!("Crawl completed successfully");
    Ok(())
}
