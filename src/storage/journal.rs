//! Metadata journal
//!
//! The journal is a single pretty-printed JSON array of [`MetadataRecord`]s
//! at `<landing zone>/<metadata dir>/dataset.json`. Every worker process
//! appends to the same file, so each append is a full read-modify-write
//! under an exclusive advisory lock with a bounded wait.

use crate::config::LandingZoneConfig;
use crate::storage::lock::{acquire_lock, read_json_array, write_json_array};
use crate::storage::traits::JournalResult;
use crate::storage::MetadataRecord;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// File name of the journal inside the metadata directory
pub const JOURNAL_FILE: &str = "dataset.json";

/// Handle to the shared metadata journal
#[derive(Debug, Clone)]
pub struct Journal {
    path: PathBuf,
    lock_path: PathBuf,
    lock_timeout: Duration,
}

impl Journal {
    /// Creates a journal handle for `dataset.json` inside `dir`
    ///
    /// Nothing is created on disk until the first append.
    pub fn new(dir: &Path, lock_timeout: Duration) -> Self {
        let path = dir.join(JOURNAL_FILE);
        let lock_path = dir.join(format!("{}.lock", JOURNAL_FILE));
        Self {
            path,
            lock_path,
            lock_timeout,
        }
    }

    /// Opens the journal of a landing zone, creating the metadata directory
    pub fn open(config: &LandingZoneConfig) -> JournalResult<Self> {
        let dir = config.metadata_path();
        std::fs::create_dir_all(&dir)?;
        Ok(Self::new(&dir, config.lock_timeout()))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Appends a record under the journal lock
    ///
    /// The current contents are read (missing or corrupt means empty), the
    /// record is pushed, exact duplicates are dropped keeping the first
    /// occurrence, and the whole array is written back atomically.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - The record is durable
    /// * `Err(JournalError::LockTimeout)` - The lock was not acquired in time;
    ///   the file is untouched
    /// * `Err(JournalError)` - Reading or writing failed
    pub fn append_record(&self, record: MetadataRecord) -> JournalResult<()> {
        let _guard = acquire_lock(&self.lock_path, self.lock_timeout)?;

        let mut records: Vec<MetadataRecord> = read_json_array(&self.path)?;
        records.push(record);
        let records = dedup_records(records);

        write_json_array(&self.path, &records)?;
        tracing::trace!(
            "Journal {} now holds {} records",
            self.path.display(),
            records.len()
        );
        Ok(())
    }

    /// Loads every record without locking
    ///
    /// A concurrent append may make the view momentarily stale, never
    /// partial.
    pub fn load(&self) -> JournalResult<Vec<MetadataRecord>> {
        read_json_array(&self.path)
    }

    /// URLs of every recorded fetch attempt
    pub fn visited_urls(&self) -> JournalResult<HashSet<String>> {
        Ok(self.load()?.into_iter().map(|record| record.url).collect())
    }

    pub fn pdf_records(&self) -> JournalResult<Vec<MetadataRecord>> {
        Ok(self.load()?.into_iter().filter(|r| r.is_pdf()).collect())
    }

    pub fn html_records(&self) -> JournalResult<Vec<MetadataRecord>> {
        Ok(self.load()?.into_iter().filter(|r| r.is_webpage()).collect())
    }

    /// Artifact paths of every successful fetch
    pub fn paths(&self) -> JournalResult<Vec<String>> {
        Ok(self.load()?.into_iter().filter_map(|r| r.path).collect())
    }
}

/// Drops structurally equal records, keeping first occurrences in order
fn dedup_records(records: Vec<MetadataRecord>) -> Vec<MetadataRecord> {
    let mut seen = HashSet::with_capacity(records.len());
    records
        .into_iter()
        .filter(|record| seen.insert(record.clone()))
        .collect()
}
