//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the HTTP client (certificate verification is off on purpose:
//!   many corpus sources serve broken chains)
//! - Retry with exponential backoff on transport errors and listed statuses
//! - Classifying responses by Content-Type
//! - Persisting the raw body to the artifact store
//!
//! A fetch never returns an error. Every failure is logged and folded into
//! a [`FetchResult`] with `succeeded == false`.

use crate::config::FetcherConfig;
use crate::crawler::parser::HtmlDocument;
use crate::storage::{ArtifactStore, ContentKind};
use reqwest::header::CONTENT_TYPE;
use reqwest::{redirect::Policy, Client, Response, StatusCode};
use std::time::Duration;
use thiserror::Error;

/// Result of a fetch operation
#[derive(Debug, Clone)]
pub struct FetchResult {
    /// Parsed page for webpages; `None` for PDFs (already on disk) and failures
    pub content: Option<HtmlDocument>,

    pub succeeded: bool,

    /// `None` when the request itself failed
    pub kind: Option<ContentKind>,
}

impl FetchResult {
    pub fn pdf() -> Self {
        Self {
            content: None,
            succeeded: true,
            kind: Some(ContentKind::Pdf),
        }
    }

    pub fn webpage(document: HtmlDocument) -> Self {
        Self {
            content: Some(document),
            succeeded: true,
            kind: Some(ContentKind::Webpage),
        }
    }

    pub fn failed(kind: Option<ContentKind>) -> Self {
        Self {
            content: None,
            succeeded: false,
            kind,
        }
    }
}

/// Longest wait between two attempts
pub const MAX_BACKOFF: Duration = Duration::from_secs(3600);

/// When and how long to wait before asking again
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, the first request included
    pub max_attempts: u32,
    pub backoff_factor: f64,
    pub retry_statuses: Vec<u16>,
}

impl RetryPolicy {
    pub fn from_config(config: &FetcherConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            backoff_factor: config.backoff_factor,
            retry_statuses: config.retry_statuses.clone(),
        }
    }

    /// Delay before the given retry (1-based): `factor * 2^(retry - 1)` seconds,
    /// capped at [`MAX_BACKOFF`]
    pub fn backoff(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(16) as i32;
        Duration::try_from_secs_f64(self.backoff_factor * 2f64.powi(exponent))
            .map_or(MAX_BACKOFF, |delay| delay.min(MAX_BACKOFF))
    }

    pub fn retries_status(&self, status: StatusCode) -> bool {
        self.retry_statuses.contains(&status.as_u16())
    }
}

/// Why a request produced no usable response
#[derive(Debug, Error)]
enum RequestFailure {
    #[error("HTTP error {status} for {url} after {attempts} attempt(s)")]
    Status {
        url: String,
        status: StatusCode,
        attempts: u32,
    },

    #[error("Max retries exceeded for {url} after {attempts} attempt(s): {source}")]
    Transport {
        url: String,
        attempts: u32,
        source: reqwest::Error,
    },
}

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```
/// use landing_crawler::config::FetcherConfig;
/// use landing_crawler::crawler::build_http_client;
///
/// let client = build_http_client(&FetcherConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &FetcherConfig) -> Result<Client, reqwest::Error> {
    let timeout = Duration::from_secs(config.timeout_secs);

    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .redirect(Policy::limited(10))
        .danger_accept_invalid_certs(true)
        .gzip(true)
        .brotli(true)
        .build()
}

/// Maps a Content-Type header to the kind of content behind it
pub fn classify_content_type(content_type: Option<&str>) -> ContentKind {
    match content_type {
        Some(value) if value.contains("application/pdf") => ContentKind::Pdf,
        Some(value) if value.contains("text/html") => ContentKind::Webpage,
        _ => ContentKind::Unknown,
    }
}

/// Fetches URLs and stores what they return
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    policy: RetryPolicy,
    artifacts: ArtifactStore,
}

impl Fetcher {
    pub fn new(client: Client, policy: RetryPolicy, artifacts: ArtifactStore) -> Self {
        Self {
            client,
            policy,
            artifacts,
        }
    }

    /// Builds a fetcher with a fresh client from configuration
    pub fn from_config(
        config: &FetcherConfig,
        artifacts: ArtifactStore,
    ) -> Result<Self, reqwest::Error> {
        let client = build_http_client(config)?;
        Ok(Self::new(client, RetryPolicy::from_config(config), artifacts))
    }

    pub fn artifacts(&self) -> &ArtifactStore {
        &self.artifacts
    }

    /// Fetches a URL, persists its body and classifies it
    ///
    /// | Outcome | succeeded | kind | side effect |
    /// |---------|-----------|------|-------------|
    /// | `application/pdf` | true | Pdf | `<hash>.pdf` written |
    /// | `text/html` | true | Webpage | `<hash>.html` written |
    /// | other Content-Type | false | Unknown | none |
    /// | HTTP error / retries exhausted | false | None | none |
    /// | body read or write error | false | None | none |
    pub async fn fetch(&self, url: &str) -> FetchResult {
        tracing::debug!("Fetching {}", url);

        let response = match self.send_with_retry(url).await {
            Ok(response) => response,
            Err(failure) => {
                tracing::error!("{}", failure);
                return FetchResult::failed(None);
            }
        };

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let kind = classify_content_type(content_type.as_deref());
        if kind == ContentKind::Unknown {
            tracing::debug!(
                "Unsupported content type {:?} for {}",
                content_type.as_deref().unwrap_or("<none>"),
                url
            );
            return FetchResult::failed(Some(ContentKind::Unknown));
        }

        let body = match response.bytes().await {
            Ok(body) => body,
            Err(e) => {
                tracing::error!("Failed to read body of {}: {}", url, e);
                return FetchResult::failed(None);
            }
        };

        let stored = match kind {
            ContentKind::Pdf => self.artifacts.save_pdf(url, &body).map(|_| FetchResult::pdf()),
            _ => self
                .artifacts
                .save_html(url, &body)
                .map(|_| {
                    FetchResult::webpage(HtmlDocument::from_bytes(&body, content_type.as_deref()))
                }),
        };

        match stored {
            Ok(result) => result,
            Err(e) => {
                tracing::error!("Failed to store {} content for {}: {}", kind.as_str(), url, e);
                FetchResult::failed(None)
            }
        }
    }

    /// Sends a GET, retrying transport errors and listed statuses
    async fn send_with_retry(&self, url: &str) -> Result<Response, RequestFailure> {
        let mut attempt = 1;

        loop {
            match self.client.get(url).send().await {
                Ok(response) => {
                    let status = response.status();
                    if !status.is_client_error() && !status.is_server_error() {
                        return Ok(response);
                    }

                    if self.policy.retries_status(status) && attempt < self.policy.max_attempts {
                        tracing::debug!(
                            "HTTP {} for {} (attempt {}/{}), retrying",
                            status,
                            url,
                            attempt,
                            self.policy.max_attempts
                        );
                    } else {
                        return Err(RequestFailure::Status {
                            url: url.to_string(),
                            status,
                            attempts: attempt,
                        });
                    }
                }
                Err(e) => {
                    // Builder errors (malformed URL) will never succeed
                    if e.is_builder() || attempt >= self.policy.max_attempts {
                        return Err(RequestFailure::Transport {
                            url: url.to_string(),
                            attempts: attempt,
                            source: e,
                        });
                    }
                    tracing::debug!(
                        "Request to {} failed (attempt {}/{}): {}",
                        url,
                        attempt,
                        self.policy.max_attempts,
                        e
                    );
                }
            }

            tokio::time::sleep(self.policy.backoff(attempt)).await;
            attempt += 1;
        }
    }
}
