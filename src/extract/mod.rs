//! Record extraction
//!
//! Two extractors share this module: [`ListingExtractor`] reads repeated
//! markup blocks on simple listing pages, and [`extract_products`] /
//! [`extract_reviews`] read JSON-LD metadata on product pages.

mod jsonld;
mod listing;
mod types;

pub use jsonld::{extract_products, extract_reviews};
pub use listing::ListingExtractor;
pub use types::{ListingRecord, ProductRecord, ReviewRecord, TAG_DELIMITER};
