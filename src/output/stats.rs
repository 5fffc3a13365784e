//! Statistics over the metadata journal
//!
//! This module summarizes journal contents for the `--stats` mode and the
//! extraction report.

use crate::storage::{Journal, JournalResult, MetadataRecord};
use serde::Serialize;

/// Journal statistics summary
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct JournalStatistics {
    /// Number of records in the journal
    pub total: usize,

    pub number_of_htmls: usize,

    pub number_of_pdfs: usize,

    /// Records with `status == true`
    pub number_of_ok: usize,

    /// Records with `status == false`
    pub number_of_ko: usize,

    /// Distinct URLs (records for the same URL with different outcomes count once)
    pub unique_urls: usize,
}

impl JournalStatistics {
    pub fn from_records(records: &[MetadataRecord]) -> Self {
        let unique_urls = records
            .iter()
            .map(|r| r.url.as_str())
            .collect::<std::collections::HashSet<_>>()
            .len();

        Self {
            total: records.len(),
            number_of_htmls: records.iter().filter(|r| r.is_webpage()).count(),
            number_of_pdfs: records.iter().filter(|r| r.is_pdf()).count(),
            number_of_ok: records.iter().filter(|r| r.status).count(),
            number_of_ko: records.iter().filter(|r| !r.status).count(),
            unique_urls,
        }
    }
}

/// Loads statistics from the journal
pub fn load_statistics(journal: &Journal) -> JournalResult<JournalStatistics> {
    Ok(JournalStatistics::from_records(&journal.load()?))
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &JournalStatistics) {
    println!("=== Journal Statistics ===\n");

    println!("Overview:");
    println!("  Records: {}", stats.total);
    println!("  Unique URLs: {}", stats.unique_urls);
    println!();

    println!("By type:");
    println!("  Webpages: {}", stats.number_of_htmls);
    println!("  PDFs: {}", stats.number_of_pdfs);
    println!();

    let success_rate = if stats.total > 0 {
        (stats.number_of_ok as f64 / stats.total as f64) * 100.0
    } else {
        0.0
    };

    println!(
        "Success Rate: {:.1}% ({} ok / {} failed)",
        success_rate, stats.number_of_ok, stats.number_of_ko
    );
}
