//! Configuration module for Crawlkeep
//!
//! This module handles loading, parsing, and validating the optional TOML configuration
//! file. Every field has a default, so a crawl can run from command-line arguments alone.
//!
//! # Example
//!
//! ```no_run
//! use crawlkeep::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("crawlkeep.toml")).unwrap();
//! println!("Sleeping {}s between requests", config.crawler.sleep_time);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlerConfig, HttpConfig, StorageConfig};

// Re-export parser functions
pub use parser::{load_config, parse_config};
pub use validation::validate;
