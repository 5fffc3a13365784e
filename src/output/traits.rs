//! Metrics sink trait and crawl events
//!
//! The orchestrator reports each major step (fetch, extract, persist) to a
//! [`MetricsSink`] at explicit call sites in its loop.

use crate::storage::ContentKind;
use std::time::Duration;

/// Something that happened while crawling one root
#[derive(Debug, Clone, PartialEq)]
pub enum CrawlEvent {
    /// A URL was fetched (successfully or not)
    Fetched {
        url: String,
        depth: u32,
        succeeded: bool,
        kind: Option<ContentKind>,
        elapsed: Duration,
    },

    /// Links were extracted from a fetched URL and queued
    LinksExtracted {
        url: String,
        found: usize,
        queued: usize,
    },

    /// The journal record for a URL is durable
    Persisted { url: String },

    /// The journal record for a URL could not be written
    PersistFailed { url: String, error: String },

    /// A frontier entry was dropped without fetching
    Skipped { url: String, depth: u32 },

    /// Position in the growing frontier
    Progress {
        root_url: String,
        processed: usize,
        total: usize,
    },
}

/// Receiver of crawl instrumentation
///
/// Implementations must be cheap and must not fail; instrumentation never
/// affects crawl results.
pub trait MetricsSink: Send + Sync {
    fn record(&self, event: &CrawlEvent);
}
