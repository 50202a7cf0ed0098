//! URL handling module for Page-Harvest
//!
//! This module provides locator canonicalization (the identity used for product
//! deduplication and the enrichment-visited set), relative reference resolution,
//! and page-number pagination for structured mode.

mod canonical;
mod paginate;

// Re-export main functions
pub use canonical::{canonicalize, resolve_canonical};
pub use paginate::{next_page_locator, page_number_of, PAGE_PARAM};

/// Derives the robots.txt locator for the site serving `target`
///
/// Keeps scheme, host and any explicit port; everything else is replaced by
/// `/robots.txt`. Returns `None` for locators without a host.
///
/// # Examples
///
/// ```
/// use page_harvest::url::robots_locator;
///
/// assert_eq!(
///     robots_locator("https://shop.example.com:8443/c?page=2").as_deref(),
///     Some("https://shop.example.com:8443/robots.txt")
/// );
/// ```
pub fn robots_locator(target: &str) -> Option<String> {
    let url = ::url::Url::parse(target).ok()?;
    let host = url.host_str()?;
    let authority = match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    };
    Some(format!("{}://{}/robots.txt", url.scheme(), authority))
}
