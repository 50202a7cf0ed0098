//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end.

use page_harvest::config::{Config, CrawlMode};
use page_harvest::crawler::{event_channel, CrawlEvent, CrawlRecords, Crawler};
use page_harvest::output::write_outcome;
use page_harvest::state::{AbortReason, RunStatus};
use page_harvest::ProductRecord;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a fast test configuration for the given seed and mode
fn create_test_config(seed: String, mode: CrawlMode) -> Config {
    let mut config = Config::default();
    config.crawler.seed_url = seed;
    config.crawler.mode = mode;
    config.crawler.delay_seconds = 0.0;
    config.crawler.max_pages = 10;
    config.fetch.backoff_factor = 0.0;
    config.user_agent.crawler_name = "TestBot".to_string();
    config.user_agent.contact_email = "test@example.com".to_string();
    config
}

/// Mounts a robots.txt that allows everything
async fn allow_all_robots(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nAllow: /"))
        .mount(server)
        .await;
}

/// Builds a listing page with the given (text, author, comma-separated tags) blocks
fn quote_page(quotes: &[(&str, &str, &str)], next: Option<&str>) -> String {
    let mut html = String::from("<html><body>");
    for (text, author, tags) in quotes {
        html.push_str(&format!(
            r#"<div class="quote"><span class="text">{}</span>
               <span>by <small class="author">{}</small></span><div class="tags">"#,
            text, author
        ));
        for tag in tags.split(',').filter(|t| !t.is_empty()) {
            html.push_str(&format!(r#"<a class="tag" href="/tag/{0}/">{0}</a>"#, tag));
        }
        html.push_str("</div></div>");
    }
    if let Some(next) = next {
        html.push_str(&format!(
            r#"<ul class="pager"><li class="next"><a href="{}">Next</a></li></ul>"#,
            next
        ));
    }
    html.push_str("</body></html>");
    html
}

/// Wraps a JSON-LD document in a page
fn jsonld_page(json: &str) -> String {
    format!(
        r#"<html><head><script type="application/ld+json">{}</script></head><body></body></html>"#,
        json
    )
}

/// Detail page carrying `count` reviews for `name`
fn detail_page(name: &str, count: usize) -> String {
    let reviews: Vec<String> = (0..count)
        .map(|i| {
            format!(
                r#"{{"author": {{"name": "reviewer-{}"}}, "reviewRating": {{"ratingValue": 4}}, "reviewBody": "Review {}"}}"#,
                i, i
            )
        })
        .collect();
    jsonld_page(&format!(
        r#"{{"@type": "Product", "name": "{}", "review": [{}]}}"#,
        name,
        reviews.join(",")
    ))
}

async fn run(config: Config) -> page_harvest::CrawlOutcome {
    Crawler::new(config, CancellationToken::new(), None)
        .expect("Failed to create crawler")
        .run()
        .await
        .expect("Crawl failed")
}

fn products(records: &CrawlRecords) -> &[ProductRecord] {
    match records {
        CrawlRecords::Products(products) => products,
        other => panic!("expected products, got {:?}", other),
    }
}

#[tokio::test]
async fn test_simple_crawl_single_page_to_csv() {
    let mock_server = MockServer::start().await;
    allow_all_robots(&mock_server).await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(quote_page(
            &[
                ("First quote", "Ann", "life,love"),
                ("Second quote", "Bob", ""),
            ],
            None,
        )))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(format!("{}/", mock_server.uri()), CrawlMode::Simple);
    let outcome = run(config).await;

    assert_eq!(outcome.status, RunStatus::Completed);
    assert_eq!(outcome.summary.pages_visited, 1);

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("quotes.csv");
    assert!(write_outcome(&outcome, &output).unwrap());

    let content = std::fs::read_to_string(&output).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "text,author,tags");
    assert_eq!(lines[1], "First quote,Ann,life;love");
    assert_eq!(lines[2], "Second quote,Bob,");
}

#[tokio::test]
async fn test_simple_crawl_follows_next_link() {
    let mock_server = MockServer::start().await;
    allow_all_robots(&mock_server).await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(quote_page(
            &[("One", "A", "x")],
            Some("/page/2/"),
        )))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/page/2/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(quote_page(
            &[("Two", "B", ""), ("Three", "C", "")],
            None,
        )))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(format!("{}/", mock_server.uri()), CrawlMode::Simple);
    let outcome = run(config).await;

    assert_eq!(outcome.status, RunStatus::Completed);
    assert_eq!(outcome.summary.pages_visited, 2);
    match &outcome.records {
        CrawlRecords::Listings(records) => {
            let texts: Vec<_> = records.iter().map(|r| r.text.as_str()).collect();
            assert_eq!(texts, vec!["One", "Two", "Three"]);
        }
        other => panic!("expected listings, got {:?}", other),
    }
}

#[tokio::test]
async fn test_page_budget_stops_before_next_page() {
    let mock_server = MockServer::start().await;
    allow_all_robots(&mock_server).await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(quote_page(
            &[("Only", "A", "")],
            Some("/page/2/"),
        )))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/page/2/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(quote_page(&[], None)))
        .expect(0)
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(format!("{}/", mock_server.uri()), CrawlMode::Simple);
    config.crawler.max_pages = 1;
    let outcome = run(config).await;

    assert_eq!(outcome.status, RunStatus::Completed);
    assert_eq!(outcome.summary.pages_visited, 1);
    assert_eq!(outcome.records.len(), 1);
}

#[tokio::test]
async fn test_structured_crawl_dedups_and_enriches() {
    let mock_server = MockServer::start().await;
    allow_all_robots(&mock_server).await;

    let page_one = jsonld_page(
        r#"[
            {"@type": "Product", "name": "Alpha", "url": "/p/a/",
             "brand": {"name": "Acme"},
             "offers": {"price": 10, "priceCurrency": "EUR"},
             "aggregateRating": {"ratingValue": 4, "reviewCount": 2}},
            {"@type": "Product", "name": "Beta", "url": "/p/b"}
        ]"#,
    );
    let page_two = jsonld_page(
        r#"{"@type": "Product", "name": "Alpha again", "url": "/p/a"}"#,
    );

    Mock::given(method("GET"))
        .and(path("/shop"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(page_one))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/shop"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(page_two))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/p/a"))
        .respond_with(ResponseTemplate::new(200).set_body_string(detail_page("Alpha", 2)))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/p/b"))
        .respond_with(ResponseTemplate::new(200).set_body_string(detail_page("Beta", 0)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(
        format!("{}/shop?page=1", mock_server.uri()),
        CrawlMode::Structured,
    );
    let outcome = run(config).await;

    assert_eq!(outcome.status, RunStatus::Completed);
    assert_eq!(outcome.summary.pages_visited, 2);
    assert_eq!(outcome.summary.detail_fetches, 2);
    assert_eq!(outcome.summary.duplicates_dropped, 1);

    let found = products(&outcome.records);
    assert_eq!(found.len(), 2);
    assert_eq!(found[0].title.as_deref(), Some("Alpha"));
    assert_eq!(
        found[0].url.as_deref(),
        Some(format!("{}/p/a", mock_server.uri()).as_str())
    );
    assert_eq!(found[0].reviews.as_ref().map(Vec::len), Some(2));
    assert_eq!(found[1].title.as_deref(), Some("Beta"));
    assert_eq!(found[1].reviews.as_ref().map(Vec::len), Some(0));

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("products.txt");
    assert!(write_outcome(&outcome, &output).unwrap());

    let report = std::fs::read_to_string(&output).unwrap();
    assert_eq!(report.matches("====\n").count(), 2);
    assert!(report.starts_with("Product: Alpha\nBrand: Acme\nPrice: 10 EUR\nStars: 4.0/5\n"));
    assert!(report.contains("- Author: reviewer-0\n  Rating: 4.0\n  Review 0\n  ---\n"));
    assert!(!report.contains("Alpha again"));
}

#[tokio::test]
async fn test_structured_products_without_url_are_dropped() {
    let mock_server = MockServer::start().await;
    allow_all_robots(&mock_server).await;

    Mock::given(method("GET"))
        .and(path("/shop"))
        .respond_with(ResponseTemplate::new(200).set_body_string(jsonld_page(
            r#"{"@type": "Product", "name": "Nowhere"}"#,
        )))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(format!("{}/shop", mock_server.uri()), CrawlMode::Structured);
    let outcome = run(config).await;

    assert_eq!(outcome.status, RunStatus::Completed);
    assert!(outcome.records.is_empty());
    assert_eq!(outcome.summary.missing_locator, 1);
    assert_eq!(outcome.summary.status_line(), "nothing found");

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("products.txt");
    assert!(!write_outcome(&outcome, &output).unwrap());
    assert!(!output.exists());
}

#[tokio::test]
async fn test_review_cap_keeps_first_reviews() {
    let mock_server = MockServer::start().await;
    allow_all_robots(&mock_server).await;

    Mock::given(method("GET"))
        .and(path("/shop"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(jsonld_page(
            r#"{"@type": "Product", "name": "Talkative", "url": "/p/t"}"#,
        )))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/p/t"))
        .respond_with(ResponseTemplate::new(200).set_body_string(detail_page("Talkative", 10)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(
        format!("{}/shop?page=1", mock_server.uri()),
        CrawlMode::Structured,
    );
    config.crawler.max_pages = 1;
    config.crawler.max_reviews = 3;
    let outcome = run(config).await;

    let found = products(&outcome.records);
    let reviews = found[0].reviews.as_ref().expect("reviews attached");
    let authors: Vec<_> = reviews.iter().filter_map(|r| r.author.as_deref()).collect();
    assert_eq!(authors, vec!["reviewer-0", "reviewer-1", "reviewer-2"]);
    assert!(reviews.iter().all(|r| r.product == "Talkative"));
}

#[tokio::test]
async fn test_enrich_same_product_twice_fetches_once() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/p/a"))
        .respond_with(ResponseTemplate::new(200).set_body_string(detail_page("Alpha", 1)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(format!("{}/shop", mock_server.uri()), CrawlMode::Structured);
    let mut crawler =
        Crawler::new(config, CancellationToken::new(), None).expect("Failed to create crawler");

    let mut first = ProductRecord {
        url: Some(format!("{}/p/a", mock_server.uri())),
        ..Default::default()
    };
    let mut second = ProductRecord {
        url: Some(format!("{}/p/a/", mock_server.uri())),
        ..Default::default()
    };

    assert!(crawler.enrich_product(&mut first).await);
    assert!(!crawler.enrich_product(&mut second).await);

    assert_eq!(first.reviews.as_ref().map(Vec::len), Some(1));
    assert!(second.reviews.is_none());
    assert_eq!(crawler.state().counters.detail_fetches, 1);
}

#[tokio::test]
async fn test_failed_detail_fetch_leaves_reviews_absent() {
    let mock_server = MockServer::start().await;
    allow_all_robots(&mock_server).await;

    Mock::given(method("GET"))
        .and(path("/shop"))
        .respond_with(ResponseTemplate::new(200).set_body_string(jsonld_page(
            r#"{"@type": "Product", "name": "Gone", "url": "/p/gone"}"#,
        )))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/p/gone"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(format!("{}/shop", mock_server.uri()), CrawlMode::Structured);
    config.crawler.max_pages = 1;
    let outcome = run(config).await;

    assert_eq!(outcome.status, RunStatus::Completed);
    let found = products(&outcome.records);
    assert_eq!(found.len(), 1);
    assert!(found[0].reviews.is_none());
}

#[tokio::test]
async fn test_robots_disallow_blocks_without_fetching() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /"))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(quote_page(&[], None)))
        .expect(0)
        .mount(&mock_server)
        .await;

    let config = create_test_config(format!("{}/", mock_server.uri()), CrawlMode::Simple);
    let outcome = run(config).await;

    assert_eq!(outcome.status, RunStatus::Blocked);
    assert_eq!(outcome.summary.pages_visited, 0);
    assert!(outcome.records.is_empty());
}

#[tokio::test]
async fn test_missing_robots_fails_open() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(quote_page(&[("Still here", "A", "")], None)),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(format!("{}/", mock_server.uri()), CrawlMode::Simple);
    let outcome = run(config).await;

    assert_eq!(outcome.status, RunStatus::Completed);
    assert_eq!(outcome.records.len(), 1);
}

#[tokio::test]
async fn test_unreachable_page_aborts_after_retries() {
    let mock_server = MockServer::start().await;
    allow_all_robots(&mock_server).await;

    // One attempt plus three retries
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(503))
        .expect(4)
        .mount(&mock_server)
        .await;

    let seed = format!("{}/", mock_server.uri());
    let config = create_test_config(seed.clone(), CrawlMode::Simple);
    let outcome = run(config).await;

    assert_eq!(
        outcome.status,
        RunStatus::Aborted(AbortReason::Unreachable { url: seed })
    );
    assert_eq!(outcome.summary.pages_visited, 0);
    assert!(outcome.records.is_empty());
}

#[tokio::test]
async fn test_partial_results_survive_abort() {
    let mock_server = MockServer::start().await;
    allow_all_robots(&mock_server).await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(quote_page(
            &[("Kept", "A", "")],
            Some("/page/2/"),
        )))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/page/2/"))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(format!("{}/", mock_server.uri()), CrawlMode::Simple);
    let outcome = run(config).await;

    assert!(matches!(
        outcome.status,
        RunStatus::Aborted(AbortReason::Unreachable { .. })
    ));
    assert_eq!(outcome.records.len(), 1);
}

#[tokio::test]
async fn test_transient_failure_then_success() {
    let mock_server = MockServer::start().await;
    allow_all_robots(&mock_server).await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(quote_page(&[("Third time", "A", "")], None)),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(format!("{}/", mock_server.uri()), CrawlMode::Simple);
    let outcome = run(config).await;

    assert_eq!(outcome.status, RunStatus::Completed);
    assert_eq!(outcome.records.len(), 1);
}

#[tokio::test]
async fn test_cancelled_run_fetches_nothing() {
    let mock_server = MockServer::start().await;
    allow_all_robots(&mock_server).await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(quote_page(&[], None)))
        .expect(0)
        .mount(&mock_server)
        .await;

    let config = create_test_config(format!("{}/", mock_server.uri()), CrawlMode::Simple);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let outcome = Crawler::new(config, cancel, None)
        .expect("Failed to create crawler")
        .run()
        .await
        .expect("Crawl failed");

    assert_eq!(outcome.status, RunStatus::Aborted(AbortReason::Cancelled));
}

#[tokio::test]
async fn test_events_end_with_done() {
    let mock_server = MockServer::start().await;
    allow_all_robots(&mock_server).await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(quote_page(&[("Q", "A", "")], None)),
        )
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(format!("{}/", mock_server.uri()), CrawlMode::Simple);
    config.crawler.max_pages = 4;

    let (tx, mut rx) = event_channel(64);
    let crawler = Crawler::new(config, CancellationToken::new(), Some(tx))
        .expect("Failed to create crawler");
    let handle = tokio::spawn(crawler.run());

    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    let outcome = handle.await.unwrap().unwrap();

    assert_eq!(outcome.status, RunStatus::Completed);
    assert_eq!(events.last(), Some(&CrawlEvent::Done(RunStatus::Completed)));
    assert!(events.contains(&CrawlEvent::Progress(25.0)));
    assert!(events
        .iter()
        .any(|e| matches!(e, CrawlEvent::Status(s) if s.starts_with("Fetching page 1"))));
}

#[tokio::test]
async fn test_delay_paces_listing_and_detail_fetches() {
    let mock_server = MockServer::start().await;
    allow_all_robots(&mock_server).await;

    let listing = jsonld_page(r#"{"@type": "Product", "name": "Alpha", "url": "/p/a"}"#);

    Mock::given(method("GET"))
        .and(path("/shop"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing.clone()))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/shop"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/p/a"))
        .respond_with(ResponseTemplate::new(200).set_body_string(detail_page("Alpha", 1)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let delay = 0.2;
    let mut config = create_test_config(
        format!("{}/shop?page=1", mock_server.uri()),
        CrawlMode::Structured,
    );
    config.crawler.delay_seconds = delay;

    let started = std::time::Instant::now();
    let outcome = run(config).await;
    let elapsed = started.elapsed().as_secs_f64();

    assert_eq!(outcome.status, RunStatus::Completed);
    assert_eq!(outcome.summary.pages_visited, 2);
    assert_eq!(outcome.summary.detail_fetches, 1);

    // robots.txt is not paced; the other three requests are
    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 4);
    let paced = (requests.len() - 1) as f64;
    assert!(
        elapsed >= (paced - 1.0) * delay,
        "crawl took {:.3}s, expected at least {:.3}s",
        elapsed,
        (paced - 1.0) * delay
    );
}
