//! Statistics generation from crawl database
//!
//! This module provides functionality for extracting and displaying
//! crawl statistics from the storage layer.

use crate::crawler::CrawlReport;
use crate::storage::{PageRecord, PageStore, TopWord, WorkQueue};
use crate::CrawlError;
use std::collections::HashMap;

/// How many words the site-wide word list shows
const SITE_WORDS_SHOWN: usize = 10;

const RECENT_PAGES_SHOWN: usize = 5;

/// Crawl statistics summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlStatistics {
    /// Every URL ever queued
    pub total_items: u64,

    /// URLs still waiting to be visited
    pub pending_items: u64,

    /// URLs visited (successfully or not)
    pub done_items: u64,

    /// Pages with a stored record
    pub pages: u64,

    /// Most frequent words summed over all stored pages
    pub site_words: Vec<TopWord>,

    /// The last few pages stored, newest first
    pub recent_pages: Vec<PageRecord>,
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to query
///
/// # Returns
///
/// * `Ok(CrawlStatistics)` - Successfully loaded statistics
/// * `Err(CrawlError)` - Failed to query statistics
pub fn load_statistics<S>(storage: &S) -> Result<CrawlStatistics, CrawlError>
where
    S: WorkQueue + PageStore,
{
    let total_items = storage.count_items()?;
    let pending_items = storage.count_pending()?;
    let done_items = storage.count_done()?;
    let mut pages = storage.all()?;

    let mut totals: HashMap<String, u32> = HashMap::new();
    for word in pages.iter().flat_map(|page| &page.top_words) {
        *totals.entry(word.word.clone()).or_insert(0) += word.count;
    }

    let mut site_words: Vec<TopWord> = totals
        .into_iter()
        .map(|(word, count)| TopWord { word, count })
        .collect();
    // Alphabetical tie-break keeps the output stable across runs
    site_words.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.word.cmp(&b.word)));
    site_words.truncate(SITE_WORDS_SHOWN);

    let page_count = pages.len() as u64;
    pages.sort_by_key(|page| std::cmp::Reverse(page.id));
    pages.truncate(RECENT_PAGES_SHOWN);
    let recent_pages = pages;

    Ok(CrawlStatistics {
        total_items,
        pending_items,
        done_items,
        pages: page_count,
        site_words,
        recent_pages,
    })
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Crawl Statistics ===\n");

    println!("Queue:");
    println!("  Total URLs queued: {}", stats.total_items);
    println!("  Visited: {}", stats.done_items);
    println!("  Pending: {}", stats.pending_items);
    println!();

    let success_rate = if stats.done_items > 0 {
        (stats.pages as f64 / stats.done_items as f64) * 100.0
    } else {
        0.0
    };
    println!(
        "Pages stored: {} ({:.1}% of visited URLs)",
        stats.pages, success_rate
    );

    if !stats.site_words.is_empty() {
        println!();
        println!("Most frequent words:");
        for word in &stats.site_words {
            println!("  {}: {}", word.word, word.count);
        }
    }

    if !stats.recent_pages.is_empty() {
        println!();
        println!("Recent pages:");
        for page in &stats.recent_pages {
            match &page.description {
                Some(description) => {
                    println!("  [{}] {} - {}", page.created_at, page.title, description)
                }
                None => println!("  [{}] {}", page.created_at, page.title),
            }
        }
    }
}

/// Prints the counters of a finished engine run
pub fn print_report(report: &CrawlReport) {
    println!("=== Crawl Report ===\n");
    println!("  Iterations: {}", report.iterations);
    println!("  Pages saved: {}", report.pages_saved);
    println!("  Links queued: {}", report.links_enqueued);
    println!("  Not found (404): {}", report.not_found);
    println!("  Rate limited (429): {}", report.rate_limited);
    println!("  Unparseable: {}", report.unparseable);
    println!("  Other failures: {}", report.failed);
}
