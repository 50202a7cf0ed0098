//! Page-Harvest main entry point
//!
//! This is the command-line interface for the Page-Harvest record harvester.

use anyhow::Context;
use clap::Parser;
use page_harvest::config::{load_config_with_hash, validate, Config, CrawlMode};
use page_harvest::crawler::events::DEFAULT_EVENT_CAPACITY;
use page_harvest::crawler::{event_channel, CrawlEvent, CrawlOutcome, Crawler};
use page_harvest::output::{print_summary, write_outcome};
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Page-Harvest: A polite paginated record harvester
///
/// Page-Harvest walks a listing site page by page while respecting
/// robots.txt and a politeness delay. Simple mode collects quote-style
/// listings into CSV; structured mode collects JSON-LD products and their
/// reviews into a text report.
#[derive(Parser, Debug)]
#[command(name = "page-harvest")]
#[command(version = "1.0.0")]
#[command(about = "A polite paginated record harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults apply when omitted)
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Seed URL of the first listing page
    #[arg(long)]
    url: Option<String>,

    /// Output file
    #[arg(short, long)]
    output: Option<String>,

    /// Extraction mode
    #[arg(long, value_enum)]
    mode: Option<CrawlMode>,

    /// Maximum number of listing pages to visit
    #[arg(short, long)]
    max_pages: Option<u32>,

    /// Delay between requests in seconds
    #[arg(short, long)]
    delay: Option<f64>,

    /// Maximum reviews kept per product, 0 for unlimited (structured mode)
    #[arg(long)]
    max_reviews: Option<u32>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,
}

impl Cli {
    /// Applies command-line values over the file (or default) configuration
    fn apply_overrides(&self, config: &mut Config) {
        if let Some(url) = &self.url {
            config.crawler.seed_url = url.clone();
        }
        if let Some(output) = &self.output {
            config.output.path = output.clone();
        }
        if let Some(mode) = self.mode {
            config.crawler.mode = mode;
        }
        if let Some(max_pages) = self.max_pages {
            config.crawler.max_pages = max_pages;
        }
        if let Some(delay) = self.delay {
            config.crawler.delay_seconds = delay;
        }
        if let Some(max_reviews) = self.max_reviews {
            config.crawler.max_reviews = max_reviews;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load configuration
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };

    cli.apply_overrides(&mut config);
    validate(&config).context("Invalid configuration")?;

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    handle_crawl(config).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("page_harvest=info,warn"),
            1 => EnvFilter::new("page_harvest=debug,info"),
            2 => EnvFilter::new("page_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: shows the effective configuration
fn handle_dry_run(config: &Config) {
    println!("=== Page-Harvest Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Seed URL: {}", config.crawler.seed_url);
    println!("  Mode: {}", config.crawler.mode);
    println!("  Max pages: {}", config.crawler.max_pages);
    println!("  Delay: {:.2}s", config.crawler.delay_seconds);
    match config.crawler.review_cap() {
        Some(cap) => println!("  Max reviews per product: {}", cap),
        None => println!("  Max reviews per product: unlimited"),
    }
    println!(
        "  Request timeout: {}s",
        config.crawler.request_timeout_seconds
    );

    println!("\nFetch:");
    println!("  Max retries: {}", config.fetch.max_retries);
    println!("  Backoff factor: {}", config.fetch.backoff_factor);

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    if config.crawler.mode == CrawlMode::Simple {
        println!("\nSelectors:");
        println!("  Block: {}", config.selectors.block);
        println!("  Text: {}", config.selectors.text);
        println!("  Author: {}", config.selectors.author);
        println!("  Tag: {}", config.selectors.tag);
        println!("  Next: {}", config.selectors.next);
    }

    println!("\nOutput:");
    println!("  Path: {}", config.output.path);

    println!("\n✓ Configuration is valid");
}

/// Handles the main crawl operation
///
/// The crawl runs on its own task; Ctrl-C cancels it and whatever was
/// collected so far is still written.
async fn handle_crawl(config: Config) -> anyhow::Result<()> {
    let output_path = PathBuf::from(&config.output.path);
    let outcome = run_in_background(config).await?;

    match write_outcome(&outcome, &output_path) {
        Ok(true) => tracing::info!("Results written to {}", output_path.display()),
        Ok(false) => {}
        Err(e) => {
            tracing::error!("Failed to write {}: {}", output_path.display(), e);
            return Err(e).context(output_context(&output_path));
        }
    }

    print_summary(&outcome.summary);
    Ok(())
}

async fn run_in_background(config: Config) -> anyhow::Result<CrawlOutcome> {
    let cancel = CancellationToken::new();
    let (tx, mut rx) = event_channel(DEFAULT_EVENT_CAPACITY);
    let crawler = Crawler::new(config, cancel.clone(), Some(tx))?;

    let handle = tokio::spawn(crawler.run());

    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping after the current request");
            interrupt.cancel();
        }
    });

    // Engine log lines already went through tracing
    while let Some(event) = rx.recv().await {
        match event {
            CrawlEvent::Status(status) => tracing::debug!("{}", status),
            CrawlEvent::Progress(percent) => tracing::debug!("Progress: {:.0}%", percent),
            CrawlEvent::Done(status) => tracing::debug!("Run status: {}", status),
            CrawlEvent::Log { .. } => {}
        }
    }

    let outcome = handle.await.context("Crawl task panicked")??;
    Ok(outcome)
}

fn output_context(path: &Path) -> String {
    format!("Could not write output file {}", path.display())
}
