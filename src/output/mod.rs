//! Output module for writing crawl results
//!
//! This module handles:
//! - Writing simple-mode listings as CSV
//! - Writing structured-mode products as a text report
//! - Summarising a finished run

mod csv_output;
mod report;
pub mod stats;
mod traits;

pub use csv_output::{CsvListingWriter, LISTING_HEADER};
pub use report::{format_product_report, format_rating, ProductReportWriter};
pub use stats::{format_summary, print_summary};
pub use traits::{CrawlSummary, OutputError, OutputResult, RecordWriter};

use crate::crawler::{CrawlOutcome, CrawlRecords};
use std::path::Path;

/// Writes the records of a finished run to `path`
///
/// The writer is chosen by the kind of records the run produced. Nothing is
/// written, and any existing file is left alone, when the run found no
/// records.
///
/// # Returns
///
/// * `Ok(true)` - The output file was written
/// * `Ok(false)` - Nothing to write
/// * `Err(OutputError)` - Writing failed
pub fn write_outcome(outcome: &CrawlOutcome, path: &Path) -> OutputResult<bool> {
    if outcome.records.is_empty() {
        tracing::warn!("No records found; {} not written", path.display());
        return Ok(false);
    }

    match &outcome.records {
        CrawlRecords::Listings(records) => CsvListingWriter.write_records(records, path)?,
        CrawlRecords::Products(records) => ProductReportWriter.write_records(records, path)?,
    }

    Ok(true)
}
