//! Crawler module for page fetching and crawl orchestration
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with retry logic
//! - Politeness pacing between requests
//! - Progress events for a host driving the run
//! - Overall crawl coordination

mod coordinator;
pub mod events;
mod fetcher;
mod scheduler;

pub use coordinator::{cap_reviews, dedup_last_seen, CrawlOutcome, CrawlRecords, Crawler};
pub use events::{event_channel, CrawlEvent, LogLevel};
pub use fetcher::{build_http_client, is_retryable_status, Fetcher, RETRYABLE_STATUSES};
pub use scheduler::{Pacer, MAX_DELAY_SECONDS};

use crate::config::Config;
use crate::HarvestError;
use tokio_util::sync::CancellationToken;

/// Runs a complete crawl operation
///
/// This is the simplest entry point: no progress channel and no way to cancel
/// from outside. It will:
/// 1. Consult robots.txt for the seed
/// 2. Fetch and extract listing pages within the page budget
/// 3. Enrich new products from their detail pages (structured mode)
/// 4. Return the deduplicated records with the run summary
///
/// # Example
///
/// ```no_run
/// use page_harvest::config::load_config;
/// use page_harvest::crawler::crawl;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("harvest.toml"))?;
/// let outcome = crawl(config).await?;
/// println!("{} records", outcome.records.len());
/// # Ok(())
/// # }
/// ```
pub async fn crawl(config: Config) -> Result<CrawlOutcome, HarvestError> {
    Crawler::new(config, CancellationToken::new(), None)?
        .run()
        .await
}
