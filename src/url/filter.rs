use crate::config::default_blocklist;

/// Substring blocklist for discovered links
///
/// A link is blocked when its string contains any entry. Matching is
/// case-sensitive and looks at the whole URL, query and fragment included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkFilter {
    blocked: Vec<String>,
}

impl LinkFilter {
    /// Creates a filter from a list of blocked substrings
    pub fn new<I, S>(blocked: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            blocked: blocked.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns true if the URL contains a blocked substring
    ///
    /// # Examples
    ///
    /// ```
    /// use landing_crawler::url::LinkFilter;
    ///
    /// let filter = LinkFilter::default();
    /// assert!(filter.is_blocked("https://www.facebook.com/page"));
    /// assert!(!filter.is_blocked("https://example.com/docs"));
    /// ```
    pub fn is_blocked(&self, url: &str) -> bool {
        self.blocked.iter().any(|needle| url.contains(needle.as_str()))
    }

    /// Drops blocked URLs, keeping the order of the rest
    pub fn retain_allowed(&self, urls: Vec<String>) -> Vec<String> {
        urls.into_iter()
            .filter(|url| {
                let blocked = self.is_blocked(url);
                if blocked {
                    tracing::trace!("Filtered link {}", url);
                }
                !blocked
            })
            .collect()
    }
}

impl Default for LinkFilter {
    fn default() -> Self {
        Self::new(default_blocklist())
    }
}
