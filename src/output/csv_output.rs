//! CSV writer for simple-mode listing records

use crate::extract::ListingRecord;
use crate::output::{OutputResult, RecordWriter};
use std::path::Path;

/// Column header of the listing file
pub const LISTING_HEADER: [&str; 3] = ["text", "author", "tags"];

/// Writes listing records as `text,author,tags` rows
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvListingWriter;

impl RecordWriter for CsvListingWriter {
    type Record = ListingRecord;

    fn write_records(&self, records: &[ListingRecord], path: &Path) -> OutputResult<()> {
        // Header written by hand so an empty run still gets one
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(path)?;
        writer.write_record(LISTING_HEADER)?;

        for record in records {
            writer.serialize(record)?;
        }

        writer.flush()?;
        tracing::info!("Saved {} rows in {}", records.len(), path.display());
        Ok(())
    }
}
