//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `CrawlPhase`: Where a run is in the fetch/extract/enrich/paginate loop
//! - `RunStatus`: How a run ended
//! - `CrawlState`: Per-run page counters and the product identity sets

mod crawl_state;
mod phase;

// Re-export main types
pub use crawl_state::{CrawlCounters, CrawlState};
pub use phase::{AbortReason, CrawlPhase, RunStatus};
