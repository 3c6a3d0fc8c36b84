//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching behind an injectable `Fetcher`
//! - HTML content extraction
//! - Rate-limit backoff
//! - The crawl loop itself

mod backoff;
mod engine;
mod extractor;
mod fetcher;

pub use backoff::{Backoff, BACKOFF_MULTIPLIER};
pub use engine::{CrawlEngine, CrawlReport};
pub use extractor::{extract, ExtractError, ExtractedPage, MIN_WORD_LENGTH, TOP_WORDS_LIMIT};
pub use fetcher::{
    build_http_client, classify_status, FetchError, FetchResponse, Fetcher, HttpFetcher,
    ResponseClass,
};

use crate::config::Config;
use crate::storage::open_storage;
use crate::CrawlError;
use std::path::Path;
use tokio_util::sync::CancellationToken;

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Open (or create) the SQLite store at `database_path`
/// 2. Build the HTTP client
/// 3. Run the engine until the queue empties or `cancel` fires
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `seed_url` - Where to start when the queue is empty
/// * `database_path` - SQLite file holding the queue and pages
/// * `cancel` - Token that requests a cooperative stop
///
/// # Returns
///
/// * `Ok(CrawlReport)` - Crawl finished or was stopped
/// * `Err(CrawlError)` - Crawl failed
pub async fn crawl(
    config: &Config,
    seed_url: &str,
    database_path: &Path,
    cancel: CancellationToken,
) -> Result<CrawlReport, CrawlError> {
    let storage = open_storage(database_path)?;
    let fetcher = HttpFetcher::new(&config.http)?;

    let mut engine = CrawlEngine::new(
        storage,
        fetcher,
        seed_url,
        config.crawler.sleep_duration(),
        cancel,
    );
    engine.run().await
}
