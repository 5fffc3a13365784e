//! Crawler module for fetching and traversing root URLs
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with retry logic and artifact storage
//! - HTML parsing and link extraction
//! - The breadth-first frontier and visited set
//! - The per-root crawl loop
//! - The worker pool that runs one crawl per root

mod coordinator;
mod fetcher;
mod frontier;
mod parser;
mod pool;

pub use coordinator::{Coordinator, CrawlSummary};
pub use fetcher::{build_http_client, classify_content_type, FetchResult, Fetcher, RetryPolicy};
pub use frontier::{Frontier, FrontierEntry, Step};
pub use parser::{extract_links, ExtractedLinks, HtmlDocument};
pub use pool::{Launcher, PoolReport, RootOutcome, RootReport, WorkerPool, WORKER_ROOT_FLAG};

use crate::config::Config;

/// Crawls every configured root URL
///
/// This is the main entry point for a crawl. It will:
/// 1. Start a worker per root, at most `workers` at a time
/// 2. Wait for every worker to settle
/// 3. Log the per-root outcome
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `launcher` - How each worker is started
///
/// # Returns
///
/// The per-root outcomes; a failed root does not fail the call
pub async fn run_crawl(config: &Config, launcher: Launcher) -> PoolReport {
    let pool = WorkerPool::new(config.crawler.workers, launcher);
    tracing::info!(
        "Crawling {} root URLs with {} workers",
        config.crawler.roots.len(),
        pool.workers()
    );

    let report = pool.crawl_many(&config.crawler.roots).await;

    let fetched: usize = report.summaries().map(|s| s.visited).sum();
    tracing::info!(
        "All workers finished: {} roots completed, {} failed, {} URLs fetched",
        report.completed(),
        report.failed(),
        fetched
    );

    report
}
