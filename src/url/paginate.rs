use crate::{UrlError, UrlResult};
use url::Url;

/// Query parameter carrying the page number in structured mode
pub const PAGE_PARAM: &str = "page";

/// Builds the locator of the page after `current_page`
///
/// The `page` query parameter is overwritten in place (or appended when
/// missing) with `current_page + 1`. Scheme, host and path are untouched.
/// Every other query parameter keeps its decoded value and position, but the
/// whole query is re-encoded as `application/x-www-form-urlencoded` (`%20`
/// becomes `+`, `:` becomes `%3A`). This is a construction, not a discovery:
/// the caller decides whether the next page is worth visiting.
///
/// # Examples
///
/// ```
/// use page_harvest::url::next_page_locator;
///
/// let next = next_page_locator("https://shop.example.com/c?page=2&sort=price", 2).unwrap();
/// assert_eq!(next, "https://shop.example.com/c?page=3&sort=price");
/// ```
pub fn next_page_locator(current: &str, current_page: u32) -> UrlResult<String> {
    let mut url = Url::parse(current).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }
    if url.host_str().is_none() {
        return Err(UrlError::MissingHost);
    }

    let next = current_page.saturating_add(1).to_string();
    let mut replaced = false;
    let mut pairs: Vec<(String, String)> = Vec::new();

    for (key, value) in url.query_pairs() {
        if key == PAGE_PARAM {
            // Only the first occurrence survives, carrying the new number
            if !replaced {
                pairs.push((key.into_owned(), next.clone()));
                replaced = true;
            }
        } else {
            pairs.push((key.into_owned(), value.into_owned()));
        }
    }

    if !replaced {
        pairs.push((PAGE_PARAM.to_string(), next));
    }

    url.query_pairs_mut().clear().extend_pairs(pairs);

    Ok(url.to_string())
}

/// Reads the page number a locator points at (`page` parameter, default 1)
pub fn page_number_of(locator: &str) -> u32 {
    Url::parse(locator)
        .ok()
        .and_then(|url| {
            url.query_pairs()
                .find(|(key, _)| key == PAGE_PARAM)
                .and_then(|(_, value)| value.trim().parse::<u32>().ok())
        })
        .unwrap_or(1)
}
