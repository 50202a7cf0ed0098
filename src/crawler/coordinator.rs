//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the crawl loop that coordinates one run:
//! - Consulting robots.txt once before any fetch
//! - Pacing and fetching listing pages
//! - Extracting and deduplicating records
//! - Enriching new products from their detail pages
//! - Following pagination until a stopping rule fires

use crate::config::{validate, Config, CrawlMode};
use crate::crawler::events::{CrawlEvent, EventSink, LogLevel};
use crate::crawler::scheduler::Pacer;
use crate::crawler::{build_http_client, Fetcher};
use crate::extract::{
    extract_products, extract_reviews, ListingExtractor, ListingRecord, ProductRecord,
    ReviewRecord,
};
use crate::output::CrawlSummary;
use crate::robots::PermissionGate;
use crate::state::{AbortReason, CrawlPhase, CrawlState, RunStatus};
use crate::url::{canonicalize, next_page_locator, page_number_of, resolve_canonical};
use crate::HarvestError;
use chrono::{DateTime, Utc};
use std::collections::hash_map::{Entry, HashMap};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Records produced by a run, by mode
#[derive(Debug, Clone, PartialEq)]
pub enum CrawlRecords {
    Listings(Vec<ListingRecord>),
    Products(Vec<ProductRecord>),
}

impl CrawlRecords {
    pub fn len(&self) -> usize {
        match self {
            Self::Listings(records) => records.len(),
            Self::Products(records) => records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total reviews attached to products (0 for listings)
    pub fn review_count(&self) -> usize {
        match self {
            Self::Listings(_) => 0,
            Self::Products(products) => products
                .iter()
                .filter_map(|p| p.reviews.as_ref())
                .map(Vec::len)
                .sum(),
        }
    }
}

/// Everything a finished run hands back to its host
///
/// Records are returned for every status, including partial results of an
/// aborted run.
#[derive(Debug, Clone)]
pub struct CrawlOutcome {
    pub status: RunStatus,
    pub records: CrawlRecords,
    pub summary: CrawlSummary,
}

/// Main crawler structure
///
/// A `Crawler` owns the state of exactly one run and is consumed by
/// [`Crawler::run`].
pub struct Crawler {
    config: Config,
    fetcher: Fetcher,
    gate: PermissionGate,
    listing: ListingExtractor,
    pacer: Pacer,
    state: CrawlState,
    cancel: CancellationToken,
    events: EventSink,
}

impl Crawler {
    /// Creates a new crawler for one run
    ///
    /// # Arguments
    ///
    /// * `config` - The run configuration; validated here
    /// * `cancel` - Token the host triggers to stop the run early
    /// * `events` - Optional channel receiving progress events
    ///
    /// # Returns
    ///
    /// * `Ok(Crawler)` - Ready to run
    /// * `Err(HarvestError)` - Invalid configuration or HTTP client failure
    pub fn new(
        config: Config,
        cancel: CancellationToken,
        events: Option<mpsc::Sender<CrawlEvent>>,
    ) -> Result<Self, HarvestError> {
        validate(&config)?;

        let client = build_http_client(
            &config.user_agent,
            Duration::from_secs(config.crawler.request_timeout_seconds),
        )?;
        let gate = PermissionGate::new(client.clone(), config.user_agent.product_token());
        let fetcher = Fetcher::new(client, &config.fetch);
        let listing = ListingExtractor::new(&config.selectors)?;
        let pacer = Pacer::new(config.crawler.delay_seconds);

        let seed = config.crawler.seed_url.trim().to_string();
        let state = CrawlState::new(seed.clone(), page_number_of(&seed));

        Ok(Self {
            config,
            fetcher,
            gate,
            listing,
            pacer,
            state,
            cancel,
            events: EventSink::new(events),
        })
    }

    /// Current run state
    pub fn state(&self) -> &CrawlState {
        &self.state
    }

    /// Runs the crawl to a terminal status
    ///
    /// Recoverable faults end the run with a status rather than an error;
    /// `Err` is reserved for internal faults such as an illegal phase change.
    pub async fn run(mut self) -> Result<CrawlOutcome, HarvestError> {
        let started_at = Utc::now();
        tracing::info!(
            "Starting {} crawl at {} (budget {} pages)",
            self.config.crawler.mode,
            self.state.current_url,
            self.config.crawler.max_pages
        );

        let mut listings = Vec::new();
        let mut products = Vec::new();
        let status = self.crawl(&mut listings, &mut products).await?;

        let records = match self.config.crawler.mode {
            CrawlMode::Simple => CrawlRecords::Listings(listings),
            CrawlMode::Structured => CrawlRecords::Products(dedup_last_seen(products)),
        };

        let summary = self.summary(started_at, &status, &records);
        self.events.log(
            LogLevel::Info,
            format!(
                "Run finished: {} ({} records, {} pages)",
                status.describe(records.len()),
                records.len(),
                self.state.pages_visited
            ),
        );
        self.events.done(status.clone()).await;

        Ok(CrawlOutcome {
            status,
            records,
            summary,
        })
    }

    async fn crawl(
        &mut self,
        listings: &mut Vec<ListingRecord>,
        products: &mut Vec<ProductRecord>,
    ) -> Result<RunStatus, HarvestError> {
        let seed = self.state.current_url.clone();
        self.events.status("Checking robots.txt");

        let permission = self.gate.check(&seed).await;
        if !permission.allowed {
            self.state.advance(CrawlPhase::Blocked)?;
            self.events.log(
                LogLevel::Warn,
                format!("robots.txt disallows {}; nothing fetched", seed),
            );
            return Ok(RunStatus::Blocked);
        }
        if let Some(delay) = permission.crawl_delay {
            self.pacer.raise_floor(delay);
        }

        let max_pages = self.config.crawler.max_pages;

        loop {
            if self.cancel.is_cancelled() {
                return self.cancelled();
            }

            // Fetching
            self.state.advance(CrawlPhase::Fetching)?;
            let url = self.state.current_url.clone();
            let page = self.state.pages_visited + 1;
            self.events.status(format!("Fetching page {}: {}", page, url));

            if !self.pacer.wait(&self.cancel).await {
                return self.cancelled();
            }
            let Some(body) = self.fetcher.fetch(&url).await else {
                self.state.advance(CrawlPhase::Aborted)?;
                self.events
                    .log(LogLevel::Error, format!("Could not fetch {}; stopping", url));
                return Ok(RunStatus::Aborted(AbortReason::Unreachable { url }));
            };
            self.state.pages_visited += 1;
            self.events.progress(self.state.pages_visited, max_pages);

            // Extracting
            self.state.advance(CrawlPhase::Extracting)?;
            let base = Url::parse(&url)?;

            match self.config.crawler.mode {
                CrawlMode::Simple => {
                    let records = self.listing.extract(&body);
                    self.events.log(
                        LogLevel::Info,
                        format!("Page {}: {} records", page, records.len()),
                    );
                    listings.extend(records);
                }
                CrawlMode::Structured => {
                    let fresh = self.accept_products(extract_products(&body), &base);
                    if fresh.is_empty() {
                        self.events.log(
                            LogLevel::Info,
                            format!("Page {}: no new products, stopping", page),
                        );
                        self.state.advance(CrawlPhase::Done)?;
                        return Ok(RunStatus::Completed);
                    }
                    self.events.log(
                        LogLevel::Info,
                        format!("Page {}: {} new products", page, fresh.len()),
                    );

                    // Enriching
                    self.state.advance(CrawlPhase::Enriching)?;
                    for mut product in fresh {
                        self.enrich_product(&mut product).await;
                        products.push(product);
                    }
                    if self.cancel.is_cancelled() {
                        return self.cancelled();
                    }
                }
            }

            // Paginating
            self.state.advance(CrawlPhase::Paginating)?;
            if self.state.budget_exhausted(max_pages) {
                self.events.log(
                    LogLevel::Info,
                    format!("Reached page budget of {}", max_pages),
                );
                self.state.advance(CrawlPhase::Done)?;
                return Ok(RunStatus::Completed);
            }

            let next = match self.config.crawler.mode {
                CrawlMode::Simple => self.listing.find_next_link(&body, &base),
                CrawlMode::Structured => {
                    match next_page_locator(&url, self.state.page_number) {
                        Ok(next) => Some(next),
                        Err(e) => {
                            self.events.log(
                                LogLevel::Warn,
                                format!("Cannot build next page locator from {}: {}", url, e),
                            );
                            None
                        }
                    }
                }
            };

            let Some(next) = next else {
                tracing::info!("No next page after {}", url);
                self.state.advance(CrawlPhase::Done)?;
                return Ok(RunStatus::Completed);
            };

            tracing::debug!("Next page: {}", next);
            self.state.page_number = self.state.page_number.saturating_add(1);
            self.state.current_url = next;
        }
    }

    /// Resolves, canonicalizes and deduplicates products from one page
    ///
    /// Returns only products whose canonical locator had not been seen; the
    /// first occurrence of a locator keeps its fields.
    fn accept_products(
        &mut self,
        extracted: Vec<ProductRecord>,
        base: &Url,
    ) -> Vec<ProductRecord> {
        let mut fresh = Vec::new();

        for mut product in extracted {
            let canonical = product
                .url
                .as_deref()
                .and_then(|href| resolve_canonical(base, href));

            let Some(canonical) = canonical else {
                self.state.counters.missing_locator += 1;
                tracing::debug!(
                    "Dropping product without usable URL: {:?}",
                    product.title.as_deref().unwrap_or("<untitled>")
                );
                continue;
            };

            if !self.state.accept(&canonical) {
                tracing::debug!("Duplicate product {}", canonical);
                continue;
            }

            product.url = Some(canonical);
            fresh.push(product);
        }

        fresh
    }

    /// Fetches a product's detail page and attaches its reviews
    ///
    /// Each canonical locator is fetched at most once per run: a second call
    /// for the same product (or a failed first attempt) does nothing. A
    /// failed fetch leaves `reviews` as `None`.
    ///
    /// # Returns
    ///
    /// True if reviews were attached by this call
    pub async fn enrich_product(&mut self, product: &mut ProductRecord) -> bool {
        let Some(url) = product.url.as_deref() else {
            return false;
        };
        let canonical = canonicalize(url);

        if !self.state.mark_enriched(&canonical) {
            tracing::debug!("Already enriched {}", canonical);
            return false;
        }
        if !self.pacer.wait(&self.cancel).await {
            return false;
        }

        self.state.counters.detail_fetches += 1;
        let Some(body) = self.fetcher.fetch(&canonical).await else {
            self.events.log(
                LogLevel::Warn,
                format!("Could not fetch details for {}", canonical),
            );
            return false;
        };

        let reviews = cap_reviews(extract_reviews(&body), self.config.crawler.review_cap());
        tracing::debug!("{} reviews from {}", reviews.len(), canonical);
        product.reviews = Some(reviews);
        true
    }

    fn cancelled(&mut self) -> Result<RunStatus, HarvestError> {
        self.state.advance(CrawlPhase::Aborted)?;
        self.events
            .log(LogLevel::Warn, "Crawl cancelled; keeping partial results");
        Ok(RunStatus::Aborted(AbortReason::Cancelled))
    }

    fn summary(
        &self,
        started_at: DateTime<Utc>,
        status: &RunStatus,
        records: &CrawlRecords,
    ) -> CrawlSummary {
        CrawlSummary {
            started_at,
            finished_at: Utc::now(),
            status: status.clone(),
            pages_visited: self.state.pages_visited,
            detail_fetches: self.state.counters.detail_fetches,
            records: records.len(),
            duplicates_dropped: self.state.counters.duplicates_dropped,
            missing_locator: self.state.counters.missing_locator,
            reviews: records.review_count(),
        }
    }
}

/// Keeps the first `cap` reviews in page order; `None` keeps all
pub fn cap_reviews(mut reviews: Vec<ReviewRecord>, cap: Option<usize>) -> Vec<ReviewRecord> {
    if let Some(cap) = cap {
        reviews.truncate(cap);
    }
    reviews
}

/// Collapses products sharing a canonical `url`
///
/// The last record for a locator wins, placed where the locator first
/// appeared. Products without a locator are kept as they are.
pub fn dedup_last_seen(products: Vec<ProductRecord>) -> Vec<ProductRecord> {
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut unique: Vec<ProductRecord> = Vec::with_capacity(products.len());

    for product in products {
        match product.url.clone() {
            Some(url) => match positions.entry(url) {
                Entry::Occupied(slot) => unique[*slot.get()] = product,
                Entry::Vacant(slot) => {
                    slot.insert(unique.len());
                    unique.push(product);
                }
            },
            None => unique.push(product),
        }
    }

    unique
}
