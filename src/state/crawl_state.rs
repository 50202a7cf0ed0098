//! Per-run crawl state
//!
//! One `CrawlState` belongs to exactly one run. It tracks the current page,
//! the page budget, and the two identity sets that keep products unique and
//! detail pages fetched at most once.

use crate::state::CrawlPhase;
use crate::HarvestError;
use std::collections::HashSet;

/// Counters reported in the run summary
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlCounters {
    /// Detail pages requested during enrichment
    pub detail_fetches: u32,

    /// Products dropped because their canonical locator was already seen
    pub duplicates_dropped: u32,

    /// Products dropped because they carried no locator
    pub missing_locator: u32,
}

/// Mutable state of one crawl run
#[derive(Debug, Clone)]
pub struct CrawlState {
    phase: CrawlPhase,

    /// Locator of the listing page being processed
    pub current_url: String,

    /// Page number of the current listing page (structured pagination)
    pub page_number: u32,

    /// Listing pages fetched so far
    pub pages_visited: u32,

    seen: HashSet<String>,
    enriched: HashSet<String>,

    pub counters: CrawlCounters,
}

impl CrawlState {
    /// Creates the state for a run starting at `seed`
    pub fn new(seed: impl Into<String>, page_number: u32) -> Self {
        Self {
            phase: CrawlPhase::Init,
            current_url: seed.into(),
            page_number,
            pages_visited: 0,
            seen: HashSet::new(),
            enriched: HashSet::new(),
            counters: CrawlCounters::default(),
        }
    }

    pub fn phase(&self) -> CrawlPhase {
        self.phase
    }

    /// Moves to `next`, rejecting steps the phase graph does not allow
    pub fn advance(&mut self, next: CrawlPhase) -> Result<(), HarvestError> {
        if !self.phase.can_transition_to(next) {
            return Err(HarvestError::InvalidTransition {
                from: self.phase,
                to: next,
            });
        }
        tracing::trace!("Phase {} -> {}", self.phase, next);
        self.phase = next;
        Ok(())
    }

    /// Returns true once `max_pages` listing pages have been visited
    pub fn budget_exhausted(&self, max_pages: u32) -> bool {
        self.pages_visited >= max_pages
    }

    /// Records a canonical locator as seen
    ///
    /// Returns false (and counts a duplicate) if it had already been seen.
    pub fn accept(&mut self, canonical: &str) -> bool {
        if self.seen.insert(canonical.to_string()) {
            true
        } else {
            self.counters.duplicates_dropped += 1;
            false
        }
    }

    /// Marks a canonical locator as enriched
    ///
    /// Returns false if it was already marked, in which case the caller must
    /// not fetch it again.
    pub fn mark_enriched(&mut self, canonical: &str) -> bool {
        self.enriched.insert(canonical.to_string())
    }
}
