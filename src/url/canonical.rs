use url::Url;

/// Canonicalizes a resource locator into its deduplication identity
///
/// # Canonicalization Steps
///
/// 1. Parse the locator; on failure (including relative input) return it unchanged
/// 2. Lowercase the scheme and host (done by the parser)
/// 3. Strip trailing slashes from the path, keeping the root `/`
/// 4. Keep the query string exactly as given
/// 5. Drop the fragment
///
/// The function is total and idempotent: canonicalizing a canonical locator
/// returns it unchanged.
///
/// # Examples
///
/// ```
/// use page_harvest::url::canonicalize;
///
/// assert_eq!(canonicalize("HTTP://Example.COM/a/?b=1#top"), "http://example.com/a?b=1");
/// assert_eq!(canonicalize("not a url"), "not a url");
/// ```
pub fn canonicalize(locator: &str) -> String {
    let mut url = match Url::parse(locator.trim()) {
        Ok(url) => url,
        Err(_) => return locator.to_string(),
    };

    // Opaque locators (mailto:, data:) have no hierarchical path to normalize
    if url.cannot_be_a_base() {
        url.set_fragment(None);
        return url.to_string();
    }

    let path = strip_trailing_slashes(url.path());
    url.set_path(&path);
    url.set_fragment(None);

    url.to_string()
}

/// Removes every trailing slash unless the path is the root
fn strip_trailing_slashes(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Resolves `href` against `base` and canonicalizes the result
///
/// Returns `None` when the reference cannot be resolved to an absolute locator.
pub fn resolve_canonical(base: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    base.join(href).ok().map(|absolute| canonicalize(absolute.as_str()))
}
