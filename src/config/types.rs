use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for the crawler
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub fetcher: FetcherConfig,
    #[serde(rename = "landing-zone")]
    pub landing_zone: LandingZoneConfig,
    #[serde(default)]
    pub transform: TransformConfig,
}

/// Crawl traversal configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Maximum link depth to follow from each root URL
    #[serde(rename = "max-depth")]
    pub max_depth: u32,

    /// Number of worker processes crawling roots in parallel
    pub workers: usize,

    /// Seed the visited set from an existing journal
    #[serde(default)]
    pub resume: bool,

    /// Root URLs, one independent crawl each
    #[serde(default)]
    pub roots: Vec<String>,

    /// Substrings that exclude a discovered link from the frontier
    #[serde(default = "default_blocklist")]
    pub blocklist: Vec<String>,
}

/// HTTP fetching configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FetcherConfig {
    /// Total attempts per URL, the first request included
    #[serde(rename = "max-attempts", default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Exponential backoff factor in seconds
    #[serde(rename = "backoff-factor", default = "default_backoff_factor")]
    pub backoff_factor: f64,

    /// Response codes that trigger another attempt
    #[serde(rename = "retry-statuses", default = "default_retry_statuses")]
    pub retry_statuses: Vec<u16>,

    /// Per-request timeout in seconds
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,
}

/// Landing zone layout
#[derive(Debug, Clone, Deserialize)]
pub struct LandingZoneConfig {
    /// Root directory for all crawl artifacts
    pub path: String,

    #[serde(rename = "metadata-dir", default = "default_metadata_dir")]
    pub metadata_dir: String,

    #[serde(rename = "documents-dir", default = "default_documents_dir")]
    pub documents_dir: String,

    #[serde(rename = "html-dir", default = "default_html_dir")]
    pub html_dir: String,

    /// Cleaned page text is only written when this is set
    #[serde(rename = "content-dir", default)]
    pub content_dir: Option<String>,

    /// Extraction reports are only written when this is set
    #[serde(rename = "report-dir", default)]
    pub report_dir: Option<String>,

    /// Maximum wait for the journal lock (milliseconds)
    #[serde(rename = "lock-timeout-ms", default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
}

/// Settings consumed by the downstream transform stage
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransformConfig {
    #[serde(rename = "accepted-languages", default)]
    pub accepted_languages: Vec<String>,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_factor: default_backoff_factor(),
            retry_statuses: default_retry_statuses(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl LandingZoneConfig {
    /// Builds a layout with the default sub-directory names under `path`
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            metadata_dir: default_metadata_dir(),
            documents_dir: default_documents_dir(),
            html_dir: default_html_dir(),
            content_dir: None,
            report_dir: None,
            lock_timeout_ms: default_lock_timeout_ms(),
        }
    }

    pub fn metadata_path(&self) -> PathBuf {
        PathBuf::from(&self.path).join(&self.metadata_dir)
    }

    pub fn documents_path(&self) -> PathBuf {
        PathBuf::from(&self.path).join(&self.documents_dir)
    }

    pub fn html_path(&self) -> PathBuf {
        PathBuf::from(&self.path).join(&self.html_dir)
    }

    pub fn content_path(&self) -> Option<PathBuf> {
        self.content_dir
            .as_ref()
            .map(|dir| PathBuf::from(&self.path).join(dir))
    }

    pub fn report_path(&self) -> Option<PathBuf> {
        self.report_dir
            .as_ref()
            .map(|dir| PathBuf::from(&self.path).join(dir))
    }

    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }
}

/// Social, messaging and commerce links never worth following for a corpus
pub fn default_blocklist() -> Vec<String> {
    [
        "twitter",
        "facebook",
        "linkedin",
        "instagram",
        "youtube",
        "just-eat.co",
        "mailto",
        "slack",
        "subscription",
        "donate",
        "meetup",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_max_attempts() -> u32 {
    5
}

fn default_backoff_factor() -> f64 {
    0.5
}

fn default_retry_statuses() -> Vec<u16> {
    vec![400, 401, 403, 500, 502, 503, 504, 505]
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("landing-crawler/{}", env!("CARGO_PKG_VERSION"))
}

fn default_metadata_dir() -> String {
    "metadata".to_string()
}

fn default_documents_dir() -> String {
    "documents".to_string()
}

fn default_html_dir() -> String {
    "html".to_string()
}

fn default_lock_timeout_ms() -> u64 {
    2000
}
