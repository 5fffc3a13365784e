use url::Url;

/// Resolves an anchor href against the page it was found on
///
/// Hrefs that already start with `http` are returned untouched. Everything
/// else is joined onto `base_url` with standard RFC 3986 reference
/// resolution. Returns `None` when the base cannot be parsed or the join
/// fails.
///
/// # Examples
///
/// ```
/// use landing_crawler::url::resolve_href;
///
/// assert_eq!(
///     resolve_href("https://example.com/a/b/", "../c").as_deref(),
///     Some("https://example.com/a/c")
/// );
/// assert_eq!(
///     resolve_href("https://example.com/", "http://other.test/x").as_deref(),
///     Some("http://other.test/x")
/// );
/// ```
pub fn resolve_href(base_url: &str, href: &str) -> Option<String> {
    if href.starts_with("http") {
        return Some(href.to_string());
    }

    let base = Url::parse(base_url).ok()?;
    base.join(href).ok().map(|url| url.to_string())
}
