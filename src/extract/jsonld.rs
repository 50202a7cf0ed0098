//! Structured-metadata extractor
//!
//! Product and review records are recovered from `<script
//! type="application/ld+json">` blocks. Publishers nest these documents in
//! arbitrary ways (arrays of arrays, `@graph` wrappers, offers inside lists),
//! so every block is walked depth-first and each object is examined for a
//! `Product` type on its own.

use crate::extract::{ProductRecord, ReviewRecord};
use scraper::{Html, Selector};
use serde::Deserialize;
use serde_json::{Map, Value};

type Object = Map<String, Value>;

const JSONLD_SELECTOR: &str = r#"script[type="application/ld+json"]"#;
const PRODUCT_TYPE: &str = "Product";

/// Extracts every product described by the page's JSON-LD blocks
///
/// Products appear in document order. Records with no field present are
/// discarded; a malformed block is skipped without affecting the others.
pub fn extract_products(html: &str) -> Vec<ProductRecord> {
    let mut products = Vec::new();

    for document in jsonld_documents(html) {
        walk_objects(&document, |node| {
            if node_type(node) == Some(PRODUCT_TYPE) {
                let product = product_from_node(node);
                if !product.is_empty() {
                    products.push(product);
                }
            }
        });
        release(document);
    }

    products
}

/// Extracts the reviews attached to products on a detail page
///
/// The owning product name is taken from the first named `Product` node on
/// the page and shared by every review collected after it.
pub fn extract_reviews(html: &str) -> Vec<ReviewRecord> {
    let mut reviews = Vec::new();
    let mut product_name: Option<String> = None;

    for document in jsonld_documents(html) {
        walk_objects(&document, |node| {
            if node_type(node) != Some(PRODUCT_TYPE) {
                return;
            }
            if product_name.is_none() {
                product_name = node
                    .get("name")
                    .and_then(scalar_text)
                    .filter(|name| !name.is_empty());
            }

            let entries: Vec<&Object> = match node.get("review") {
                Some(Value::Array(items)) => items.iter().filter_map(Value::as_object).collect(),
                Some(Value::Object(single)) => vec![single],
                _ => Vec::new(),
            };

            for entry in entries {
                reviews.push(review_from_node(entry, product_name.as_deref()));
            }
        });
        release(document);
    }

    reviews
}

/// Parses every JSON-LD block on the page, dropping the ones that fail
fn jsonld_documents(html: &str) -> Vec<Value> {
    let Ok(selector) = Selector::parse(JSONLD_SELECTOR) else {
        return Vec::new();
    };
    let document = Html::parse_document(html);

    document
        .select(&selector)
        .filter_map(|script| {
            let raw: String = script.text().collect();
            if raw.trim().is_empty() {
                return Some(Value::Object(Object::new()));
            }
            match parse_block(&raw) {
                Ok(value) => Some(value),
                Err(e) => {
                    tracing::debug!("Skipping malformed JSON-LD block: {}", e);
                    None
                }
            }
        })
        .collect()
}

/// Parses one block with no nesting limit
///
/// The stack grows on demand while deserializing, so depth is bounded by
/// memory rather than by the thread's stack size.
fn parse_block(raw: &str) -> Result<Value, serde_json::Error> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    deserializer.disable_recursion_limit();
    let value = Value::deserialize(serde_stacker::Deserializer::new(&mut deserializer))?;
    deserializer.end()?;
    Ok(value)
}

/// Drops a parsed document iteratively
///
/// Dropping a `Value` recurses once per nesting level.
fn release(root: Value) {
    let mut stack = vec![root];

    while let Some(node) = stack.pop() {
        match node {
            Value::Array(items) => stack.extend(items),
            Value::Object(object) => stack.extend(object.into_iter().map(|(_, child)| child)),
            _ => {}
        }
    }
}

/// Visits every object inside `root` exactly once, in document order
///
/// Uses an explicit stack so deeply nested input cannot exhaust the call
/// stack. Children are pushed in reverse to pop in their original order.
fn walk_objects<'a>(root: &'a Value, mut visit: impl FnMut(&'a Object)) {
    let mut stack: Vec<&'a Value> = vec![root];

    while let Some(node) = stack.pop() {
        match node {
            Value::Array(items) => stack.extend(items.iter().rev()),
            Value::Object(object) => {
                visit(object);
                stack.extend(
                    object
                        .values()
                        .rev()
                        .filter(|child| child.is_object() || child.is_array()),
                );
            }
            _ => {}
        }
    }
}

fn product_from_node(node: &Object) -> ProductRecord {
    let offer = first_object(node.get("offers"));
    let aggregate = first_object(node.get("aggregateRating"));

    let from_offer = |key: &str| offer.and_then(|o| o.get(key)).and_then(scalar_text);

    ProductRecord {
        title: node.get("name").and_then(scalar_text),
        description: node.get("description").and_then(scalar_text),
        sku: node.get("sku").and_then(scalar_text),
        brand: node.get("brand").and_then(name_or_string),
        price: from_offer("price"),
        currency: from_offer("priceCurrency"),
        availability: from_offer("availability"),
        url: node.get("url").and_then(scalar_text),
        rating: aggregate
            .and_then(|a| a.get("ratingValue"))
            .and_then(coerce_f64)
            .filter(|rating| (0.0..=5.0).contains(rating)),
        review_count: aggregate
            .and_then(|a| a.get("reviewCount"))
            .and_then(coerce_u64),
        reviews: None,
    }
}

fn review_from_node(entry: &Object, product_name: Option<&str>) -> ReviewRecord {
    let body = entry
        .get("reviewBody")
        .and_then(scalar_text)
        .filter(|body| !body.is_empty())
        .or_else(|| entry.get("description").and_then(scalar_text));

    ReviewRecord {
        product: product_name.unwrap_or_default().to_string(),
        author: entry.get("author").and_then(name_or_string),
        rating: entry
            .get("reviewRating")
            .and_then(Value::as_object)
            .and_then(|r| r.get("ratingValue"))
            .and_then(coerce_f64),
        body,
    }
}

/// Declared type of a node: `@type`, else `type`; first element of a list
fn node_type(node: &Object) -> Option<&str> {
    let declared = node
        .get("@type")
        .filter(|value| is_present(value))
        .or_else(|| node.get("type"))?;

    match declared {
        Value::String(s) => Some(s.as_str()),
        Value::Array(items) => items.first().and_then(Value::as_str),
        _ => None,
    }
}

/// `null`, `""` and `[]` count as absent
fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        _ => true,
    }
}

/// A single object, or the first element of a list when that is an object
fn first_object(value: Option<&Value>) -> Option<&Object> {
    match value? {
        Value::Object(object) => Some(object),
        Value::Array(items) => items.first().and_then(Value::as_object),
        _ => None,
    }
}

/// A bare string, or the `name` of an object
fn name_or_string(value: &Value) -> Option<String> {
    match value {
        Value::Object(object) => object.get("name").and_then(scalar_text),
        other => scalar_text(other),
    }
}

/// Strings as-is, numbers rendered to text
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn coerce_f64(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    number.is_finite().then_some(number)
}

fn coerce_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0)
                .map(|f| f.trunc() as u64)
        }),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    }
}
