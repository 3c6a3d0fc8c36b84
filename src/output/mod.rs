//! Output module for reporting on crawl results
//!
//! This module handles:
//! - Loading statistics from the queue and page tables
//! - Printing them for the `--stats` mode and at the end of a crawl

pub mod stats;

pub use stats::{load_statistics, print_report, print_statistics, CrawlStatistics};
