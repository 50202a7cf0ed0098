use serde::{Serialize, Serializer};

/// Separator used when a listing's tags are flattened into one field
pub const TAG_DELIMITER: &str = ";";

/// One flat record from a simple listing page
///
/// Serializes as one `text,author,tags` row with the tags joined.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ListingRecord {
    pub text: String,
    pub author: String,
    #[serde(serialize_with = "serialize_joined")]
    pub tags: Vec<String>,
}

impl ListingRecord {
    /// Tags joined by [`TAG_DELIMITER`]
    pub fn joined_tags(&self) -> String {
        self.tags.join(TAG_DELIMITER)
    }
}

fn serialize_joined<S: Serializer>(tags: &[String], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&tags.join(TAG_DELIMITER))
}

/// A product recovered from JSON-LD metadata
///
/// `url` is the identity key once the record has been accepted by a crawl,
/// at which point it holds the canonical absolute locator.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductRecord {
    pub title: Option<String>,
    pub description: Option<String>,
    pub sku: Option<String>,
    pub brand: Option<String>,
    pub price: Option<String>,
    pub currency: Option<String>,
    pub availability: Option<String>,
    pub url: Option<String>,
    pub rating: Option<f64>,
    pub review_count: Option<u64>,

    /// Filled by enrichment; `None` until the detail page has been read
    pub reviews: Option<Vec<ReviewRecord>>,
}

impl ProductRecord {
    /// True when every extracted field is absent
    ///
    /// `reviews` is not an extracted field and does not count.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.sku.is_none()
            && self.brand.is_none()
            && self.price.is_none()
            && self.currency.is_none()
            && self.availability.is_none()
            && self.url.is_none()
            && self.rating.is_none()
            && self.review_count.is_none()
    }
}

/// A review belonging to one product
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReviewRecord {
    /// Name of the owning product
    pub product: String,
    pub author: Option<String>,
    pub rating: Option<f64>,
    pub body: Option<String>,
}
