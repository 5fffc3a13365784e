//! Metrics sink implementations

use crate::output::traits::{CrawlEvent, MetricsSink};
use crate::storage::ContentKind;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Logs every event through `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl MetricsSink for TracingSink {
    fn record(&self, event: &CrawlEvent) {
        match event {
            CrawlEvent::Fetched {
                url,
                depth,
                succeeded,
                kind,
                elapsed,
            } => {
                let kind = kind.map(|k| k.as_str()).unwrap_or("none");
                if *succeeded {
                    tracing::info!("Fetched {} [{}] depth {} in {:?}", url, kind, depth, elapsed);
                } else {
                    tracing::info!(
                        "Fetch failed for {} [{}] depth {} after {:?}",
                        url,
                        kind,
                        depth,
                        elapsed
                    );
                }
            }
            CrawlEvent::LinksExtracted { url, found, queued } => {
                tracing::debug!("{}: {} links found, {} queued", url, found, queued);
            }
            CrawlEvent::Persisted { url } => {
                tracing::trace!("Recorded {}", url);
            }
            CrawlEvent::PersistFailed { url, error } => {
                tracing::error!("Failed to record {} in journal: {}", url, error);
            }
            CrawlEvent::Skipped { url, depth } => {
                tracing::debug!("{} already visited or depth {} out of reach", url, depth);
            }
            CrawlEvent::Progress {
                root_url,
                processed,
                total,
            } => {
                tracing::info!("Progress for {}: {}/{}", root_url, processed, total);
            }
        }
    }
}

/// Counts events with atomics
#[derive(Debug, Default)]
pub struct StatsSink {
    pub fetched: AtomicUsize,
    pub succeeded: AtomicUsize,
    pub failed: AtomicUsize,
    pub pdfs: AtomicUsize,
    pub webpages: AtomicUsize,
    pub links_queued: AtomicUsize,
    pub persisted: AtomicUsize,
    pub persist_failures: AtomicUsize,
    pub skipped: AtomicUsize,
}

impl StatsSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

impl MetricsSink for StatsSink {
    fn record(&self, event: &CrawlEvent) {
        match event {
            CrawlEvent::Fetched {
                succeeded, kind, ..
            } => {
                self.fetched.fetch_add(1, Ordering::SeqCst);
                if *succeeded {
                    self.succeeded.fetch_add(1, Ordering::SeqCst);
                } else {
                    self.failed.fetch_add(1, Ordering::SeqCst);
                }
                match kind {
                    Some(ContentKind::Pdf) if *succeeded => {
                        self.pdfs.fetch_add(1, Ordering::SeqCst);
                    }
                    Some(ContentKind::Webpage) if *succeeded => {
                        self.webpages.fetch_add(1, Ordering::SeqCst);
                    }
                    _ => {}
                }
            }
            CrawlEvent::LinksExtracted { queued, .. } => {
                self.links_queued.fetch_add(*queued, Ordering::SeqCst);
            }
            CrawlEvent::Persisted { .. } => {
                self.persisted.fetch_add(1, Ordering::SeqCst);
            }
            CrawlEvent::PersistFailed { .. } => {
                self.persist_failures.fetch_add(1, Ordering::SeqCst);
            }
            CrawlEvent::Skipped { .. } => {
                self.skipped.fetch_add(1, Ordering::SeqCst);
            }
            CrawlEvent::Progress { .. } => {}
        }
    }
}

/// Forwards every event to several sinks
#[derive(Clone, Default)]
pub struct FanoutSink {
    sinks: Vec<Arc<dyn MetricsSink>>,
}

impl FanoutSink {
    pub fn new(sinks: Vec<Arc<dyn MetricsSink>>) -> Self {
        Self { sinks }
    }
}

impl MetricsSink for FanoutSink {
    fn record(&self, event: &CrawlEvent) {
        for sink in &self.sinks {
            sink.record(event);
        }
    }
}
