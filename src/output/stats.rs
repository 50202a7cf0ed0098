//! Run summary display
//!
//! This module prints the summary of a finished run to stdout.

use crate::output::CrawlSummary;

/// Formats the summary as the lines printed after a run
pub fn format_summary(summary: &CrawlSummary) -> String {
    let mut out = String::new();

    out.push_str("=== Crawl Summary ===\n\n");

    out.push_str("Run:\n");
    out.push_str(&format!("  Status: {}\n", summary.status_line()));
    out.push_str(&format!(
        "  Started: {}\n",
        summary.started_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    out.push_str(&format!("  Duration: {:.1}s\n", summary.duration_seconds()));
    out.push('\n');

    out.push_str("Traffic:\n");
    out.push_str(&format!("  Listing pages visited: {}\n", summary.pages_visited));
    out.push_str(&format!("  Detail pages fetched: {}\n", summary.detail_fetches));
    out.push('\n');

    out.push_str("Records:\n");
    out.push_str(&format!("  Records: {}\n", summary.records));
    if summary.reviews > 0 {
        out.push_str(&format!("  Reviews: {}\n", summary.reviews));
    }
    if summary.duplicates_dropped > 0 {
        out.push_str(&format!("  Duplicates dropped: {}\n", summary.duplicates_dropped));
    }
    if summary.missing_locator > 0 {
        out.push_str(&format!(
            "  Dropped without URL: {}\n",
            summary.missing_locator
        ));
    }

    out
}

/// Prints the summary to stdout
pub fn print_summary(summary: &CrawlSummary) {
    print!("{}", format_summary(summary));
}
