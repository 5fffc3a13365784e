//! Content-addressed artifact store
//!
//! Raw PDFs and HTML pages are written to `<hash>.pdf` / `<hash>.html`, where
//! `hash` is [`hash_url`] of the source URL. A name depends only on the URL,
//! so two processes writing the same artifact write the same bytes and no
//! locking is needed.

use crate::config::LandingZoneConfig;
use crate::storage::{ContentKind, MetadataRecord};
use crate::url::hash_url;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};

/// Cleaned text of one page, stored as `<hash>.json` in the content directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanedContent {
    pub hash_parent_url: String,
    pub parent_url: String,
    pub hash_url: String,
    pub current_url: String,
    pub content: String,
    /// Path of the raw HTML the text was extracted from
    pub path: String,
}

/// Writes and names artifacts inside a landing zone
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    documents: PathBuf,
    html: PathBuf,
    content: Option<PathBuf>,
}

impl ArtifactStore {
    pub fn new(config: &LandingZoneConfig) -> Self {
        Self {
            documents: config.documents_path(),
            html: config.html_path(),
            content: config.content_path(),
        }
    }

    /// Creates every configured artifact directory
    pub fn prepare(&self) -> io::Result<()> {
        std::fs::create_dir_all(&self.documents)?;
        std::fs::create_dir_all(&self.html)?;
        if let Some(content) = &self.content {
            std::fs::create_dir_all(content)?;
        }
        Ok(())
    }

    pub fn pdf_path(&self, url: &str) -> PathBuf {
        self.documents.join(format!("{}.pdf", hash_url(url)))
    }

    pub fn html_path(&self, url: &str) -> PathBuf {
        self.html.join(format!("{}.html", hash_url(url)))
    }

    pub fn content_path(&self, url: &str) -> Option<PathBuf> {
        self.content
            .as_ref()
            .map(|dir| dir.join(format!("{}.json", hash_url(url))))
    }

    pub fn has_content_store(&self) -> bool {
        self.content.is_some()
    }

    /// Path of the stored artifact for a URL of the given kind
    pub fn artifact_path(&self, url: &str, kind: ContentKind) -> Option<PathBuf> {
        match kind {
            ContentKind::Pdf => Some(self.pdf_path(url)),
            ContentKind::Webpage => Some(self.html_path(url)),
            ContentKind::Unknown => None,
        }
    }

    pub fn save_pdf(&self, url: &str, bytes: &[u8]) -> io::Result<PathBuf> {
        let path = self.pdf_path(url);
        std::fs::write(&path, bytes)?;
        Ok(path)
    }

    pub fn save_html(&self, url: &str, bytes: &[u8]) -> io::Result<PathBuf> {
        let path = self.html_path(url);
        std::fs::write(&path, bytes)?;
        Ok(path)
    }

    /// Writes the cleaned-text record for a page
    ///
    /// Returns `Ok(None)` without writing when no content directory is
    /// configured or the text is empty.
    pub fn save_cleaned_content(
        &self,
        parent_url: &str,
        url: &str,
        content: &str,
    ) -> io::Result<Option<PathBuf>> {
        let Some(json_path) = self.content_path(url) else {
            return Ok(None);
        };
        if content.is_empty() {
            return Ok(None);
        }

        let record = CleanedContent {
            hash_parent_url: hash_url(parent_url),
            parent_url: parent_url.to_string(),
            hash_url: hash_url(url),
            current_url: url.to_string(),
            content: content.to_string(),
            path: path_string(&self.html_path(url)),
        };

        let json = serde_json::to_vec_pretty(&record)?;
        std::fs::write(&json_path, json)?;
        Ok(Some(json_path))
    }

    /// Builds the journal record for a fetch outcome
    ///
    /// Failed fetches carry no type and no path; successful ones point at
    /// the artifact the fetcher wrote.
    pub fn record_for(&self, url: &str, succeeded: bool, kind: Option<ContentKind>) -> MetadataRecord {
        let content_type = kind.filter(|k| *k != ContentKind::Unknown);
        let path = if succeeded {
            content_type
                .and_then(|k| self.artifact_path(url, k))
                .map(|p| path_string(&p))
        } else {
            None
        };

        MetadataRecord {
            hash_url: hash_url(url),
            url: url.to_string(),
            status: succeeded,
            content_type,
            path,
        }
    }
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
