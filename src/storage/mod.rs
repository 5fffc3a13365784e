//! Storage module for persisting crawl data
//!
//! This module handles everything the crawler writes to the landing zone:
//! - The metadata journal (`dataset.json`), shared by all worker processes
//! - Content-addressed PDF and HTML artifacts
//! - Optional cleaned-text records per page

mod artifacts;
mod journal;
mod lock;
mod traits;

pub use artifacts::{ArtifactStore, CleanedContent};
pub use journal::{Journal, JOURNAL_FILE};
pub use lock::{acquire_lock, read_json_array, write_json_array, LockGuard};
pub use traits::{JournalError, JournalResult};

use serde::{Deserialize, Serialize};

/// Kind of content behind a fetched URL, decided by its Content-Type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Pdf,
    Webpage,
    Unknown,
}

impl ContentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Webpage => "webpage",
            Self::Unknown => "unknown",
        }
    }

    /// Artifact file extension, if this kind is stored
    pub fn extension(&self) -> Option<&'static str> {
        match self {
            Self::Pdf => Some("pdf"),
            Self::Webpage => Some("html"),
            Self::Unknown => None,
        }
    }
}

/// One journal entry per fetch attempt
///
/// The serialized shape is the handoff contract with the transform stage:
/// `{"hash_url", "url", "status", "type": "pdf"|"webpage"|null, "path"}`.
/// Equality covers every field, so the same URL with a different outcome is
/// a different record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MetadataRecord {
    pub hash_url: String,
    pub url: String,
    pub status: bool,
    #[serde(rename = "type")]
    pub content_type: Option<ContentKind>,
    pub path: Option<String>,
}

impl MetadataRecord {
    pub fn is_pdf(&self) -> bool {
        self.content_type == Some(ContentKind::Pdf)
    }

    pub fn is_webpage(&self) -> bool {
        self.content_type == Some(ContentKind::Webpage)
    }
}
