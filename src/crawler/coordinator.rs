//! Crawler coordinator - crawl loop for a single root URL
//!
//! This module contains the breadth-first loop that coordinates one root
//! crawl:
//! - Seeding the frontier (optionally from the journal when resuming)
//! - Fetching each URL and storing its artifact
//! - Writing cleaned page text and the journal record
//! - Extracting links and queuing the next depth
//! - Appending the extraction report once the frontier is exhausted
//!
//! The loop is strictly sequential. Parallelism lives one level up, in the
//! worker pool, with one coordinator crawl per root.

use crate::config::Config;
use crate::crawler::fetcher::{FetchResult, Fetcher};
use crate::crawler::frontier::{Frontier, FrontierEntry, Step};
use crate::crawler::parser::extract_links;
use crate::output::report::report_timestamp;
use crate::output::{
    CrawlEvent, ExtractionReport, JournalStatistics, MetricsSink, ReportEntry, RunDetails,
    TracingSink,
};
use crate::storage::{ArtifactStore, Journal, JournalError};
use crate::url::LinkFilter;
use crate::CrawlError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

/// Outcome of crawling one root URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlSummary {
    pub root_url: String,

    /// OS process id of the worker that ran the crawl
    pub worker_id: u32,

    /// URLs fetched
    pub visited: usize,

    pub succeeded: usize,

    pub failed: usize,

    /// Frontier entries dropped as already visited or too deep
    pub skipped: usize,

    /// Journal appends that did not make it to disk
    pub journal_failures: usize,

    pub elapsed_ms: u64,
}

/// Main crawler coordinator structure
pub struct Coordinator {
    config: Arc<Config>,
    fetcher: Fetcher,
    journal: Journal,
    filter: LinkFilter,
    metrics: Arc<dyn MetricsSink>,
}

impl Coordinator {
    /// Creates a coordinator for the landing zone described by `config`
    ///
    /// Creates the landing-zone directories and builds the HTTP client.
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to crawl
    /// * `Err(CrawlError)` - A directory could not be created or the client
    ///   could not be built
    pub fn new(config: Arc<Config>) -> Result<Self, CrawlError> {
        let artifacts = ArtifactStore::new(&config.landing_zone);
        artifacts.prepare()?;

        let journal = Journal::open(&config.landing_zone)?;
        let fetcher = Fetcher::from_config(&config.fetcher, artifacts)?;
        let filter = LinkFilter::new(&config.crawler.blocklist);

        Ok(Self {
            config,
            fetcher,
            journal,
            filter,
            metrics: Arc::new(TracingSink),
        })
    }

    /// Replaces the metrics sink (the default logs through `tracing`)
    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsSink>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    /// Crawls `root_url` breadth-first down to the configured depth
    ///
    /// Per visited URL the order is: fetch, cleaned content, journal
    /// record, link extraction. A failed journal append is counted and
    /// reported but does not stop the crawl.
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlSummary)` - The frontier was exhausted
    /// * `Err(CrawlError)` - The journal could not be read to resume
    pub async fn crawl(&self, root_url: &str) -> Result<CrawlSummary, CrawlError> {
        let started = Instant::now();
        let started_at = chrono::Local::now();
        let max_depth = self.config.crawler.max_depth;

        let mut frontier = if self.config.crawler.resume && self.journal.exists() {
            let visited = self.journal.visited_urls()?;
            tracing::info!(
                "Resuming {} with {} URLs already in the journal",
                root_url,
                visited.len()
            );
            Frontier::with_visited(root_url, max_depth, visited)
        } else {
            Frontier::new(root_url, max_depth)
        };

        tracing::info!("Starting crawl of {} (max depth {})", root_url, max_depth);

        let mut summary = CrawlSummary {
            root_url: root_url.to_string(),
            worker_id: std::process::id(),
            visited: 0,
            succeeded: 0,
            failed: 0,
            skipped: 0,
            journal_failures: 0,
            elapsed_ms: 0,
        };

        while let Some(step) = frontier.next_step() {
            let entry = match step {
                Step::Visit(entry) => entry,
                Step::Skip(entry) => {
                    summary.skipped += 1;
                    self.metrics.record(&CrawlEvent::Skipped {
                        url: entry.url,
                        depth: entry.depth,
                    });
                    continue;
                }
            };

            let result = self.visit(&entry, &mut summary).await;

            let links = extract_links(&entry.url, &result, &self.filter);
            let found = links.urls.len();
            let queued = frontier.enqueue_children(&entry, links.urls);
            self.metrics.record(&CrawlEvent::LinksExtracted {
                url: entry.url.clone(),
                found,
                queued,
            });

            self.metrics.record(&CrawlEvent::Progress {
                root_url: root_url.to_string(),
                processed: frontier.processed(),
                total: frontier.enqueued(),
            });
        }

        summary.elapsed_ms = started.elapsed().as_millis() as u64;
        tracing::info!(
            "Crawl of {} completed: {} fetched ({} ok, {} failed), {} skipped in {:?}",
            root_url,
            summary.visited,
            summary.succeeded,
            summary.failed,
            summary.skipped,
            started.elapsed()
        );

        self.write_report(&summary, started_at).await;

        Ok(summary)
    }

    /// Fetches one entry and persists everything derived from it
    async fn visit(&self, entry: &FrontierEntry, summary: &mut CrawlSummary) -> FetchResult {
        let fetch_started = Instant::now();
        let result = self.fetcher.fetch(&entry.url).await;

        summary.visited += 1;
        if result.succeeded {
            summary.succeeded += 1;
        } else {
            summary.failed += 1;
        }
        self.metrics.record(&CrawlEvent::Fetched {
            url: entry.url.clone(),
            depth: entry.depth,
            succeeded: result.succeeded,
            kind: result.kind,
            elapsed: fetch_started.elapsed(),
        });

        if let Some(document) = &result.content {
            let artifacts = self.fetcher.artifacts();
            if artifacts.has_content_store() {
                let parent = entry.parent.as_deref().unwrap_or("");
                if let Err(e) =
                    artifacts.save_cleaned_content(parent, &entry.url, &document.text_content())
                {
                    tracing::warn!("Failed to write cleaned content for {}: {}", entry.url, e);
                }
            }
        }

        let record = self
            .fetcher
            .artifacts()
            .record_for(&entry.url, result.succeeded, result.kind);
        match self.append_record(record).await {
            Ok(()) => self.metrics.record(&CrawlEvent::Persisted {
                url: entry.url.clone(),
            }),
            Err(e) => {
                if e.is_lock_timeout() {
                    tracing::warn!("Journal lock contended, record for {} not written", entry.url);
                }
                summary.journal_failures += 1;
                self.metrics.record(&CrawlEvent::PersistFailed {
                    url: entry.url.clone(),
                    error: e.to_string(),
                });
            }
        }

        result
    }

    async fn append_record(
        &self,
        record: crate::storage::MetadataRecord,
    ) -> Result<(), JournalError> {
        let journal = self.journal.clone();
        match tokio::task::spawn_blocking(move || journal.append_record(record)).await {
            Ok(result) => result,
            Err(e) => Err(JournalError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("journal append task failed: {}", e),
            ))),
        }
    }

    /// Appends this crawl to the extraction report when a report directory
    /// is configured
    async fn write_report(
        &self,
        summary: &CrawlSummary,
        started_at: chrono::DateTime<chrono::Local>,
    ) {
        let Some(dir) = self.config.landing_zone.report_path() else {
            return;
        };

        let report = ExtractionReport::new(&dir, self.config.landing_zone.lock_timeout());
        let journal = self.journal.clone();
        let run = RunDetails {
            root_url: summary.root_url.clone(),
            worker_id: summary.worker_id,
            workers: self.config.crawler.workers,
            depth: self.config.crawler.max_depth,
            started_at: report_timestamp(started_at),
            finished_at: report_timestamp(chrono::Local::now()),
            elapsed: std::time::Duration::from_millis(summary.elapsed_ms),
        };

        let outcome = tokio::task::spawn_blocking(move || {
            let stats = JournalStatistics::from_records(&journal.load()?);
            report.append(ReportEntry::new(&stats, run))
        })
        .await;

        match outcome {
            Ok(Ok(true)) => tracing::debug!("Extraction report updated for {}", summary.root_url),
            Ok(Ok(false)) => {
                tracing::debug!("{} already in the extraction report", summary.root_url)
            }
            Ok(Err(e)) => tracing::warn!(
                "Failed to update extraction report for {}: {}",
                summary.root_url,
                e
            ),
            Err(e) => tracing::warn!("Extraction report task failed: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CrawlerConfig, FetcherConfig, LandingZoneConfig, TransformConfig};
    use crate::output::StatsSink;
    use tempfile::TempDir;

    fn test_config(dir: &TempDir) -> Config {
        Config {
            crawler: CrawlerConfig {
                max_depth: 1,
                workers: 1,
                resume: false,
                roots: vec!["http://127.0.0.1:9/".to_string()],
                blocklist: crate::config::default_blocklist(),
            },
            fetcher: FetcherConfig {
                max_attempts: 1,
                backoff_factor: 0.0,
                timeout_secs: 1,
                ..FetcherConfig::default()
            },
            landing_zone: LandingZoneConfig::new(dir.path().to_string_lossy()),
            transform: TransformConfig::default(),
        }
    }

    #[test]
    fn test_new_prepares_landing_zone() {
        let dir = TempDir::new().unwrap();
        let config = test_config(&dir);
        let coordinator = Coordinator::new(Arc::new(config.clone())).unwrap();

        assert!(config.landing_zone.documents_path().is_dir());
        assert!(config.landing_zone.html_path().is_dir());
        assert!(config.landing_zone.metadata_path().is_dir());
        assert!(!coordinator.journal().exists());
    }

    #[tokio::test]
    async fn test_unreachable_root_is_recorded_as_failure() {
        let dir = TempDir::new().unwrap();
        let stats = Arc::new(StatsSink::new());
        let coordinator = Coordinator::new(Arc::new(test_config(&dir)))
            .unwrap()
            .with_metrics(stats.clone());

        let summary = coordinator.crawl("http://127.0.0.1:9/").await.unwrap();

        assert_eq!(summary.visited, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.journal_failures, 0);
        assert_eq!(summary.worker_id, std::process::id());
        assert_eq!(StatsSink::get(&stats.persisted), 1);

        let records = coordinator.journal().load().unwrap();
        assert_eq!(records.len(), 1);
        assert!(!records[0].status);
        assert_eq!(records[0].content_type, None);
        assert_eq!(records[0].path, None);
    }

    #[test]
    fn test_summary_json_round_trip() {
        let summary = CrawlSummary {
            root_url: "https://a.test/".to_string(),
            worker_id: 7,
            visited: 2,
            succeeded: 2,
            failed: 0,
            skipped: 1,
            journal_failures: 0,
            elapsed_ms: 15,
        };
        let line = serde_json::to_string(&summary).unwrap();
        assert!(!line.contains('\n'));
        assert_eq!(serde_json::from_str::<CrawlSummary>(&line).unwrap(), summary);
    }
}
