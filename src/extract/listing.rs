//! Simple-listing extractor
//!
//! Pulls flat records out of repeated listing blocks and locates the "next
//! page" anchor. Selectors come from configuration and are compiled once.

use crate::config::SelectorConfig;
use crate::extract::ListingRecord;
use crate::ConfigError;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Compiled selectors for one listing layout
#[derive(Debug, Clone)]
pub struct ListingExtractor {
    block: Selector,
    text: Selector,
    author: Selector,
    tag: Selector,
    next: Selector,
}

impl ListingExtractor {
    /// Compiles the configured selectors
    ///
    /// # Returns
    ///
    /// * `Ok(ListingExtractor)` - Every selector parsed
    /// * `Err(ConfigError::InvalidSelector)` - The first selector that did not
    pub fn new(config: &SelectorConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            block: compile(&config.block)?,
            text: compile(&config.text)?,
            author: compile(&config.author)?,
            tag: compile(&config.tag)?,
            next: compile(&config.next)?,
        })
    }

    /// Extracts every listing block in document order
    ///
    /// Missing text or author fields become empty strings; a block without tags
    /// gets an empty tag list.
    ///
    /// # Example
    ///
    /// ```
    /// use page_harvest::config::SelectorConfig;
    /// use page_harvest::extract::ListingExtractor;
    ///
    /// let extractor = ListingExtractor::new(&SelectorConfig::default()).unwrap();
    /// let html = r#"<div class="quote"><span class="text">Hi</span></div>"#;
    /// let records = extractor.extract(html);
    /// assert_eq!(records[0].text, "Hi");
    /// assert_eq!(records[0].author, "");
    /// ```
    pub fn extract(&self, html: &str) -> Vec<ListingRecord> {
        let document = Html::parse_document(html);

        document
            .select(&self.block)
            .map(|block| ListingRecord {
                text: first_text(block, &self.text),
                author: first_text(block, &self.author),
                tags: block
                    .select(&self.tag)
                    .map(stripped_text)
                    .collect(),
            })
            .collect()
    }

    /// Finds the "next page" anchor and resolves it against `base_url`
    ///
    /// Returns `None` when no anchor exists, its `href` is empty, or it cannot
    /// be resolved to an absolute locator.
    pub fn find_next_link(&self, html: &str, base_url: &Url) -> Option<String> {
        let document = Html::parse_document(html);
        let anchor = document.select(&self.next).next()?;
        let href = anchor.value().attr("href")?.trim();
        if href.is_empty() {
            return None;
        }
        base_url.join(href).ok().map(|url| url.to_string())
    }
}

fn compile(selector: &str) -> Result<Selector, ConfigError> {
    Selector::parse(selector).map_err(|e| ConfigError::InvalidSelector {
        selector: selector.to_string(),
        message: format!("{:?}", e),
    })
}

/// Text of the first element matching `selector` under `block`, or ""
fn first_text(block: ElementRef<'_>, selector: &Selector) -> String {
    block
        .select(selector)
        .next()
        .map(stripped_text)
        .unwrap_or_default()
}

/// Every text node trimmed, then concatenated
fn stripped_text(element: ElementRef<'_>) -> String {
    element.text().map(str::trim).collect()
}
