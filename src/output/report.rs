//! Extraction report
//!
//! After each root crawl the orchestrator appends one entry to
//! `<report dir>/extraction_report.json` describing the journal at that
//! moment and the run that produced it. The file is shared between workers
//! and written with the same lock-then-rewrite discipline as the journal.
//! A root that already has an entry is not reported twice.

use crate::output::stats::JournalStatistics;
use crate::storage::{acquire_lock, read_json_array, write_json_array, JournalResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const REPORT_FILE: &str = "extraction_report.json";

/// One root crawl, as recorded in the extraction report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportEntry {
    pub total: usize,
    pub number_of_htmls: usize,
    pub number_of_pdfs: usize,
    #[serde(rename = "number_of_OK")]
    pub number_of_ok: usize,
    #[serde(rename = "number_of_KO")]
    pub number_of_ko: usize,
    pub execution_time_seconds: f64,
    pub timestamp_start: String,
    pub timestamp_end: String,
    pub root_url: String,
    pub worker_id: u32,
    pub workers: usize,
    pub depth: u32,
}

impl ReportEntry {
    /// Combines journal statistics with the details of one root crawl
    pub fn new(stats: &JournalStatistics, run: RunDetails) -> Self {
        Self {
            total: stats.total,
            number_of_htmls: stats.number_of_htmls,
            number_of_pdfs: stats.number_of_pdfs,
            number_of_ok: stats.number_of_ok,
            number_of_ko: stats.number_of_ko,
            execution_time_seconds: run.elapsed.as_secs_f64(),
            timestamp_start: run.started_at,
            timestamp_end: run.finished_at,
            root_url: run.root_url,
            worker_id: run.worker_id,
            workers: run.workers,
            depth: run.depth,
        }
    }
}

/// Details of a finished root crawl
#[derive(Debug, Clone)]
pub struct RunDetails {
    pub root_url: String,
    pub worker_id: u32,
    pub workers: usize,
    pub depth: u32,
    pub started_at: String,
    pub finished_at: String,
    pub elapsed: Duration,
}

/// Writer for the shared extraction report
#[derive(Debug, Clone)]
pub struct ExtractionReport {
    path: PathBuf,
    lock_path: PathBuf,
    lock_timeout: Duration,
}

impl ExtractionReport {
    pub fn new(dir: &Path, lock_timeout: Duration) -> Self {
        Self {
            path: dir.join(REPORT_FILE),
            lock_path: dir.join(format!("{}.lock", REPORT_FILE)),
            lock_timeout,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends an entry unless its root is already reported
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - The entry was added
    /// * `Ok(false)` - The root was already present; nothing changed
    pub fn append(&self, entry: ReportEntry) -> JournalResult<bool> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let _guard = acquire_lock(&self.lock_path, self.lock_timeout)?;

        let mut entries: Vec<ReportEntry> = read_json_array(&self.path)?;
        if entries.iter().any(|e| e.root_url == entry.root_url) {
            return Ok(false);
        }

        entries.push(entry);
        write_json_array(&self.path, &entries)?;
        Ok(true)
    }

    pub fn load(&self) -> JournalResult<Vec<ReportEntry>> {
        read_json_array(&self.path)
    }
}

/// Formats a timestamp the way the report stores it
pub fn report_timestamp(time: chrono::DateTime<chrono::Local>) -> String {
    time.format("%Y-%m-%d %H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn entry(root: &str) -> ReportEntry {
        let stats = JournalStatistics {
            total: 3,
            number_of_htmls: 2,
            number_of_pdfs: 1,
            number_of_ok: 3,
            number_of_ko: 0,
            unique_urls: 3,
        };
        ReportEntry::new(
            &stats,
            RunDetails {
                root_url: root.to_string(),
                worker_id: 42,
                workers: 2,
                depth: 1,
                started_at: "2024-01-01 00:00:00".to_string(),
                finished_at: "2024-01-01 00:00:05".to_string(),
                elapsed: Duration::from_secs(5),
            },
        )
    }

    #[test]
    fn test_append_skips_reported_roots() {
        let dir = TempDir::new().unwrap();
        let report = ExtractionReport::new(&dir.path().join("reports"), Duration::from_secs(2));

        assert!(report.append(entry("https://a.test/")).unwrap());
        assert!(!report.append(entry("https://a.test/")).unwrap());
        assert!(report.append(entry("https://b.test/")).unwrap());

        let entries = report.load().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].execution_time_seconds, 5.0);
    }

    #[test]
    fn test_entry_json_keys() {
        let value = serde_json::to_value(entry("https://a.test/")).unwrap();
        assert_eq!(value["number_of_OK"], 3);
        assert_eq!(value["number_of_KO"], 0);
        assert_eq!(value["root_url"], "https://a.test/");
    }

    #[test]
    fn test_report_timestamp_format() {
        use chrono::TimeZone;
        let time = chrono::Local.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        assert_eq!(report_timestamp(time), "2024-03-09 07:05:01");
    }
}
