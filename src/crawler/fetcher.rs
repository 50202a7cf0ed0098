//! HTTP fetcher implementation
//!
//! This module handles all page retrieval for the crawler, including:
//! - Building the HTTP client with the crawler's identity header
//! - Retrying transient failures with exponential backoff
//! - Honouring `Retry-After` on throttled responses
//! - Classifying failures into retryable and terminal ones

use crate::config::{FetchConfig, UserAgentConfig};
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{redirect::Policy, Client, StatusCode};
use std::time::Duration;

/// Statuses treated as transient and retried
pub const RETRYABLE_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

/// Maximum redirect hops followed per request
const MAX_REDIRECTS: usize = 10;

/// Upper bound on a server-requested `Retry-After` sleep
const MAX_RETRY_AFTER: Duration = Duration::from_secs(60);

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
/// * `timeout` - Per-request timeout
///
/// # Example
///
/// ```no_run
/// use page_harvest::config::UserAgentConfig;
/// use page_harvest::crawler::build_http_client;
/// use std::time::Duration;
///
/// let config = UserAgentConfig {
///     crawler_name: "PageHarvest".to_string(),
///     crawler_version: "1.0".to_string(),
///     contact_url: "https://example.com/info".to_string(),
///     contact_email: "crawler@example.com".to_string(),
/// };
///
/// let client = build_http_client(&config, Duration::from_secs(10)).unwrap();
/// ```
pub fn build_http_client(
    config: &UserAgentConfig,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    // Format: CrawlerName/Version (+ContactURL; ContactEmail)
    Client::builder()
        .user_agent(config.header_value())
        .timeout(timeout)
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Returns true if a response with this status should be retried
pub fn is_retryable_status(status: StatusCode) -> bool {
    RETRYABLE_STATUSES.contains(&status.as_u16())
}

/// Outcome of a single request attempt
#[derive(Debug)]
enum Attempt {
    Body(String),
    Retry {
        reason: String,
        retry_after: Option<Duration>,
    },
    Fail(String),
}

/// Retrieves pages over HTTP with bounded retries
///
/// # Retry Logic
///
/// | Condition | Action |
/// |-----------|--------|
/// | 2xx | Body returned |
/// | 429, 500, 502, 503, 504 | Retry with backoff (`Retry-After` honoured, max 60 s) |
/// | Request timeout | Retry with backoff |
/// | Other status | Immediate failure |
/// | DNS / connection refused / TLS | Immediate failure |
/// | Body decode failure | Immediate failure |
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    max_retries: u32,
    backoff_factor: f64,
}

impl Fetcher {
    /// Creates a fetcher that sends every request with `client`
    pub fn new(client: Client, config: &FetchConfig) -> Self {
        Self {
            client,
            max_retries: config.max_retries,
            backoff_factor: config.backoff_factor,
        }
    }

    /// Fetches `url` and returns its body
    ///
    /// Returns `None` once the failure is terminal or retries are exhausted;
    /// the reason is logged at error level.
    pub async fn fetch(&self, url: &str) -> Option<String> {
        let mut retry = 0u32;

        loop {
            match self.attempt(url).await {
                Attempt::Body(body) => return Some(body),
                Attempt::Retry {
                    reason,
                    retry_after,
                } if retry < self.max_retries => {
                    retry += 1;
                    let mut delay = self.backoff_delay(retry);
                    if let Some(requested) = retry_after {
                        delay = delay.max(requested);
                    }
                    tracing::warn!(
                        "Transient failure fetching {} ({}), retry {}/{} in {:.1}s",
                        url,
                        reason,
                        retry,
                        self.max_retries,
                        delay.as_secs_f64()
                    );
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
                Attempt::Retry { reason, .. } => {
                    tracing::error!(
                        "Error fetching {}: {} (gave up after {} retries)",
                        url,
                        reason,
                        self.max_retries
                    );
                    return None;
                }
                Attempt::Fail(reason) => {
                    tracing::error!("Error fetching {}: {}", url, reason);
                    return None;
                }
            }
        }
    }

    /// Sleep before retry number `retry` (1-based): `factor * 2^(retry-1)`
    pub fn backoff_delay(&self, retry: u32) -> Duration {
        if retry == 0 {
            return Duration::ZERO;
        }
        let exponent = (retry - 1).min(16) as i32;
        let seconds = self.backoff_factor * 2f64.powi(exponent);
        Duration::try_from_secs_f64(seconds).unwrap_or(Duration::ZERO)
    }

    async fn attempt(&self, url: &str) -> Attempt {
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) if e.is_timeout() => {
                return Attempt::Retry {
                    reason: format!("timeout: {}", e),
                    retry_after: None,
                }
            }
            Err(e) => return Attempt::Fail(e.to_string()),
        };

        let status = response.status();
        if status.is_success() {
            return match response.text().await {
                Ok(body) => Attempt::Body(body),
                Err(e) if e.is_timeout() => Attempt::Retry {
                    reason: format!("timeout reading body: {}", e),
                    retry_after: None,
                },
                Err(e) => Attempt::Fail(format!("could not read body: {}", e)),
            };
        }

        if is_retryable_status(status) {
            return Attempt::Retry {
                reason: format!("HTTP {}", status.as_u16()),
                retry_after: retry_after(response.headers()),
            };
        }

        Attempt::Fail(format!("HTTP {}", status.as_u16()))
    }
}

/// Reads a `Retry-After` header given in whole seconds, capped at 60 s
fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    let seconds = headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()?;
    Some(Duration::from_secs(seconds).min(MAX_RETRY_AFTER))
}
