//! Storage module for persisting crawl data
//!
//! This module handles all database operations for the crawler, including:
//! - SQLite database initialization and schema management
//! - The persistent work queue (dedup by URL, FIFO by discovery time)
//! - Extracted page records and their most frequent words

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{PageStore, StorageError, StorageResult, WorkQueue};

use std::path::Path;

/// Initializes or opens a storage database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteStorage)` - Successfully initialized storage
/// * `Err(StorageError)` - Failed to initialize storage
pub fn open_storage(path: &Path) -> StorageResult<SqliteStorage> {
    SqliteStorage::new(path)
}

/// A discovered URL together with its visitation status
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueItem {
    pub id: i64,
    pub url: String,
    /// The item whose page linked here, if any
    pub parent_id: Option<i64>,
    pub done: bool,
    pub created_at: String,
    pub last_edited: String,
}

/// A candidate for insertion into the work queue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewQueueItem {
    pub url: String,
    pub parent_id: Option<i64>,
}

impl NewQueueItem {
    pub fn new(url: impl Into<String>, parent_id: Option<i64>) -> Self {
        Self {
            url: url.into(),
            parent_id,
        }
    }
}

/// A word and how often it appeared in a page's visible text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopWord {
    pub word: String,
    pub count: u32,
}

impl TopWord {
    pub fn new(word: impl Into<String>, count: u32) -> Self {
        Self {
            word: word.into(),
            count,
        }
    }
}

/// Extracted metadata for a successfully visited page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRecord {
    pub id: i64,
    /// The queue item this page describes
    pub url_id: i64,
    pub title: String,
    pub description: Option<String>,
    /// Ordered by descending frequency
    pub top_words: Vec<TopWord>,
    pub created_at: String,
}
