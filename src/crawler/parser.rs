//! HTML parser for extracting links and text
//!
//! This module handles:
//! - Holding fetched page source as a traversable document
//! - Collecting anchor links in document order and resolving them
//! - Filtering links through the blocklist
//! - Producing cleaned page text for the content store

use crate::crawler::fetcher::FetchResult;
use crate::storage::ContentKind;
use crate::url::{resolve_href, LinkFilter};
use encoding_rs::{Encoding, UTF_8};
use scraper::{Html, Selector};

/// Fetched HTML page
///
/// Holds the decoded source and parses it on demand. The parsed tree is
/// not `Send`, so it never outlives a single call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlDocument {
    source: String,
}

impl HtmlDocument {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }

    /// Decodes raw response bytes with the charset named in `content_type`
    ///
    /// Falls back to UTF-8 when there is no charset or the label is unknown.
    /// Malformed sequences become U+FFFD.
    pub fn from_bytes(bytes: &[u8], content_type: Option<&str>) -> Self {
        let encoding = content_type
            .and_then(charset_label)
            .and_then(|label| Encoding::for_label(label.as_bytes()))
            .unwrap_or(UTF_8);

        let (text, _, _) = encoding.decode(bytes);
        Self::new(text.into_owned())
    }

    /// The page source exactly as decoded
    pub fn source(&self) -> &str {
        &self.source
    }

    fn parse(&self) -> Html {
        Html::parse_document(&self.source)
    }

    /// Raw `href` values of every `<a href>` in document order
    pub fn hrefs(&self) -> Vec<String> {
        let document = self.parse();
        let Ok(selector) = Selector::parse("a[href]") else {
            return Vec::new();
        };

        document
            .select(&selector)
            .filter_map(|element| element.value().attr("href"))
            .map(str::to_string)
            .collect()
    }

    /// Visible text of the page
    ///
    /// Text nodes inside `script`, `style` and `noscript` are skipped; the
    /// rest are trimmed, empty ones dropped, and joined with single spaces.
    pub fn text_content(&self) -> String {
        let document = self.parse();
        let mut chunks = Vec::new();

        for node in document.root_element().descendants() {
            let Some(text) = node.value().as_text() else {
                continue;
            };

            let hidden = node.ancestors().any(|ancestor| {
                ancestor
                    .value()
                    .as_element()
                    .map(|element| matches!(element.name(), "script" | "style" | "noscript"))
                    .unwrap_or(false)
            });
            if hidden {
                continue;
            }

            let trimmed = text.trim();
            if !trimmed.is_empty() {
                chunks.push(trimmed);
            }
        }

        chunks.join(" ")
    }
}

/// The `charset` parameter of a Content-Type value, unquoted
fn charset_label(content_type: &str) -> Option<&str> {
    content_type.split(';').skip(1).find_map(|param| {
        let (name, value) = param.split_once('=')?;
        if !name.trim().eq_ignore_ascii_case("charset") {
            return None;
        }
        let value = value.trim().trim_matches('"');
        (!value.is_empty()).then_some(value)
    })
}

/// Links extracted from one fetch result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedLinks {
    pub kind: Option<ContentKind>,
    pub succeeded: bool,
    pub urls: Vec<String>,
}

/// Extracts the links to follow from a fetch result
///
/// # Rules
///
/// - PDFs are leaves: succeeded with no links
/// - Failed fetches yield no links
/// - Webpages yield every anchor href in document order, resolved against
///   `base_url`, minus anything the blocklist matches. Duplicates are kept;
///   the frontier deals with them.
///
/// # Example
///
/// ```
/// use landing_crawler::crawler::{extract_links, FetchResult, HtmlDocument};
/// use landing_crawler::url::LinkFilter;
///
/// let page = HtmlDocument::new(r#"<a href="/x">x</a><a href="mailto:a@b.c">mail</a>"#);
/// let result = FetchResult::webpage(page);
/// let links = extract_links("https://a.test/", &result, &LinkFilter::default());
/// assert_eq!(links.urls, vec!["https://a.test/x"]);
/// ```
pub fn extract_links(base_url: &str, result: &FetchResult, filter: &LinkFilter) -> ExtractedLinks {
    if result.kind == Some(ContentKind::Pdf) {
        return ExtractedLinks {
            kind: Some(ContentKind::Pdf),
            succeeded: true,
            urls: Vec::new(),
        };
    }

    if !result.succeeded {
        return ExtractedLinks {
            kind: None,
            succeeded: false,
            urls: Vec::new(),
        };
    }

    let mut urls = Vec::new();
    if let Some(document) = &result.content {
        for href in document.hrefs() {
            match resolve_href(base_url, &href) {
                Some(url) => urls.push(url),
                None => tracing::debug!("Could not resolve {} against {}", href, base_url),
            }
        }
    }

    ExtractedLinks {
        kind: Some(ContentKind::Webpage),
        succeeded: true,
        urls: filter.retain_allowed(urls),
    }
}
