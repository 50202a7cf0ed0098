use clap::ValueEnum;
use serde::Deserialize;
use std::fmt;

/// Main configuration structure for Page-Harvest
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default, rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub selectors: SelectorConfig,
}

/// Which extraction strategy a run uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CrawlMode {
    /// Flat listing blocks, paginated by following the "next" link
    #[default]
    #[serde(alias = "quotes")]
    #[value(alias = "quotes")]
    Simple,

    /// JSON-LD products, paginated by incrementing the `page` parameter
    #[serde(alias = "shop")]
    #[value(alias = "shop")]
    Structured,
}

impl fmt::Display for CrawlMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Simple => write!(f, "simple"),
            Self::Structured => write!(f, "structured"),
        }
    }
}

/// Crawl behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Listing page the crawl starts from
    #[serde(rename = "seed-url")]
    pub seed_url: String,

    pub mode: CrawlMode,

    /// Maximum number of listing pages fetched in one run
    #[serde(rename = "max-pages")]
    pub max_pages: u32,

    /// Minimum pause between consecutive requests (seconds)
    #[serde(rename = "delay-seconds")]
    pub delay_seconds: f64,

    /// Reviews kept per product in structured mode (0 = unlimited)
    #[serde(rename = "max-reviews")]
    pub max_reviews: u32,

    #[serde(rename = "request-timeout-seconds")]
    pub request_timeout_seconds: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            seed_url: "https://quotes.toscrape.com/".to_string(),
            mode: CrawlMode::Simple,
            max_pages: 50,
            delay_seconds: 1.0,
            max_reviews: 0,
            request_timeout_seconds: 10,
        }
    }
}

impl CrawlerConfig {
    /// Review cap as an option; `None` means unlimited
    pub fn review_cap(&self) -> Option<usize> {
        match self.max_reviews {
            0 => None,
            n => Some(n as usize),
        }
    }
}

/// Retry behavior of the fetcher
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Retries after the first attempt on transient failures
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// Exponential backoff base factor (seconds)
    #[serde(rename = "backoff-factor")]
    pub backoff_factor: f64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_factor: 0.3,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "PageHarvest".to_string(),
            crawler_version: "1.0".to_string(),
            contact_url: "https://example.com/info".to_string(),
            contact_email: "crawler@example.com".to_string(),
        }
    }
}

impl UserAgentConfig {
    /// Full header value: `CrawlerName/Version (+ContactURL; ContactEmail)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }

    /// Token robots.txt groups are matched against
    pub fn product_token(&self) -> &str {
        &self.crawler_name
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// CSV file (simple mode) or text report (structured mode)
    pub path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: "output.csv".to_string(),
        }
    }
}

/// CSS selectors used by the listing extractor
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// One listing block
    pub block: String,

    /// Primary text inside a block
    pub text: String,

    /// Attribution inside a block
    pub author: String,

    /// Tag labels inside a block
    pub tag: String,

    /// The "next page" anchor
    pub next: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            block: "div.quote".to_string(),
            text: "span.text".to_string(),
            author: "small.author".to_string(),
            tag: "div.tags a.tag".to_string(),
            next: "li.next a".to_string(),
        }
    }
}
