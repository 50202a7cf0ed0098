//! Robots.txt handling module
//!
//! The permission gate fetches a site's robots.txt once per run and decides
//! whether the crawl may start. It fails open: an unreachable, missing, or
//! unreadable policy never blocks a crawl.

mod parser;

pub use parser::ParsedRobots;

use crate::url::robots_locator;
use reqwest::Client;

/// Verdict of the permission gate for one target
#[derive(Debug, Clone, PartialEq)]
pub struct Permission {
    /// Whether the target may be fetched
    pub allowed: bool,

    /// Crawl-delay (seconds) declared for our product token, if any
    pub crawl_delay: Option<f64>,

    /// True when the verdict is the fail-open default rather than a parsed policy
    pub fail_open: bool,
}

/// Consults a site's robots.txt before a crawl
pub struct PermissionGate {
    client: Client,
    product_token: String,
}

impl PermissionGate {
    /// Creates a gate that sends requests with `client` (which carries the
    /// identity header) and evaluates rules for `product_token`
    pub fn new(client: Client, product_token: impl Into<String>) -> Self {
        Self {
            client,
            product_token: product_token.into(),
        }
    }

    /// Decides whether `target` may be crawled
    ///
    /// # Policy
    ///
    /// | robots.txt response | Verdict |
    /// |---------------------|---------|
    /// | 2xx | Parsed rules for the product token |
    /// | Any other status | Allowed (fail open, warning logged) |
    /// | Network error / timeout | Allowed (fail open, warning logged) |
    /// | Body not decodable | Allowed (fail open, warning logged) |
    pub async fn check(&self, target: &str) -> Permission {
        let (robots, fail_open) = match self.load(target).await {
            Some(robots) => (robots, false),
            None => (ParsedRobots::allow_all(), true),
        };

        let allowed = robots.is_allowed(target, &self.product_token);
        let crawl_delay = robots.crawl_delay(&self.product_token);
        tracing::debug!(
            "robots.txt checked for {}: allowed={}, crawl_delay={:?}, fail_open={}",
            target,
            allowed,
            crawl_delay,
            fail_open
        );

        Permission {
            allowed,
            crawl_delay,
            fail_open,
        }
    }

    /// Fetches and parses the policy for `target`, `None` when it cannot be read
    async fn load(&self, target: &str) -> Option<ParsedRobots> {
        let Some(robots_url) = robots_locator(target) else {
            tracing::warn!(
                "Cannot derive robots.txt location from {}; continuing without a policy",
                target
            );
            return None;
        };

        match self.fetch_policy(&robots_url).await {
            Ok(content) => Some(ParsedRobots::from_content(&content)),
            Err(reason) => {
                tracing::warn!(
                    "Could not read robots.txt ({}): {}. Continuing with caution.",
                    robots_url,
                    reason
                );
                None
            }
        }
    }

    /// Retrieves the policy text; any failure is reported as a reason string
    async fn fetch_policy(&self, robots_url: &str) -> Result<String, String> {
        let response = self
            .client
            .get(robots_url)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("HTTP {}", status.as_u16()));
        }

        response.text().await.map_err(|e| e.to_string())
    }
}
