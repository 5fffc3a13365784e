//! Output module for crawl instrumentation and reports
//!
//! This module handles:
//! - The metrics sink the orchestrator reports each step to
//! - Statistics over the metadata journal
//! - The per-root extraction report

mod metrics;
pub mod report;
pub mod stats;
mod traits;

pub use metrics::{FanoutSink, StatsSink, TracingSink};
pub use report::{ExtractionReport, ReportEntry, RunDetails};
pub use stats::{load_statistics, print_statistics, JournalStatistics};
pub use traits::{CrawlEvent, MetricsSink};
