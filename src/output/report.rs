//! Product report generation
//!
//! Structured-mode results are written as a plain-text report: one block per
//! product, its reviews nested underneath, blocks separated by `====`.

use crate::extract::ProductRecord;
use crate::output::traits::{OutputResult, RecordWriter};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes products and their reviews as a text report
#[derive(Debug, Clone, Copy, Default)]
pub struct ProductReportWriter;

impl RecordWriter for ProductReportWriter {
    type Record = ProductRecord;

    fn write_records(&self, records: &[ProductRecord], path: &Path) -> OutputResult<()> {
        let report = format_product_report(records);

        let mut file = File::create(path)?;
        file.write_all(report.as_bytes())?;

        tracing::info!("Saved {} products in {}", records.len(), path.display());
        Ok(())
    }
}

/// Formats products as report blocks
///
/// # Arguments
///
/// * `products` - The products to format, in output order
///
/// # Returns
///
/// The report text; empty when there are no products
pub fn format_product_report(products: &[ProductRecord]) -> String {
    let mut report = String::new();

    for product in products {
        report.push_str(&format!("Product: {}\n", text(&product.title)));
        report.push_str(&format!("Brand: {}\n", text(&product.brand)));
        report.push_str(&format!("Price: {}\n", price_line(product)));
        if let Some(rating) = product.rating {
            report.push_str(&format!("Stars: {}/5\n", format_rating(rating)));
        }
        report.push_str(&format!("URL: {}\n", text(&product.url)));

        report.push_str("Reviews:\n");
        for review in product.reviews.iter().flatten() {
            report.push_str(&format!("- Author: {}\n", text(&review.author)));
            if let Some(rating) = review.rating {
                report.push_str(&format!("  Rating: {}\n", format_rating(rating)));
            }
            let body = review.body.as_deref().unwrap_or_default().trim();
            if !body.is_empty() {
                report.push_str(&format!("  {}\n", body));
            }
            report.push_str("  ---\n");
        }

        report.push_str("====\n");
    }

    report
}

/// Renders a rating with at least one decimal place (`4.0`, `4.5`, `4.25`)
pub fn format_rating(rating: f64) -> String {
    if rating.fract() == 0.0 {
        format!("{:.1}", rating)
    } else {
        rating.to_string()
    }
}

fn text(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or_default()
}

/// Price and currency separated by a space, either may be absent
fn price_line(product: &ProductRecord) -> String {
    [product.price.as_deref(), product.currency.as_deref()]
        .into_iter()
        .flatten()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
