//! Output writer traits and types
//!
//! This module defines the trait interface for record writers and the run
//! summary every crawl produces.

use crate::state::RunStatus;
use chrono::{DateTime, Utc};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Summary statistics for a crawl
#[derive(Debug, Clone)]
pub struct CrawlSummary {
    // Run metadata
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub status: RunStatus,

    // Traffic
    pub pages_visited: u32,
    pub detail_fetches: u32,

    // Records
    pub records: usize,
    pub duplicates_dropped: u32,
    pub missing_locator: u32,
    pub reviews: usize,
}

impl CrawlSummary {
    /// Wall-clock duration of the run in seconds
    pub fn duration_seconds(&self) -> f64 {
        (self.finished_at - self.started_at)
            .to_std()
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0)
    }

    /// Status as shown to the user ("nothing found" for an empty completed run)
    pub fn status_line(&self) -> String {
        self.status.describe(self.records)
    }
}

/// Trait for record writers
///
/// A writer turns one kind of record into one output file. Writers replace
/// the file; they never append to the output of an earlier run.
pub trait RecordWriter {
    type Record;

    /// Writes `records` to `path`
    ///
    /// # Arguments
    ///
    /// * `records` - The records to write, in output order
    /// * `path` - Destination file, created or truncated
    fn write_records(&self, records: &[Self::Record], path: &Path) -> OutputResult<()>;
}
