//! Storage traits and error types
//!
//! This module defines the two storage seams the crawl engine talks to and the
//! errors they surface.

use crate::storage::{NewQueueItem, PageRecord, QueueItem, TopWord};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    /// No pending item and no default to fall back on
    #[error("Queue is empty")]
    QueueEmpty,

    #[error("Queue item not found: {0}")]
    ItemNotFound(i64),

    #[error("Page write rejected: {0}")]
    PageWrite(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Persistent store of crawl targets
///
/// Every mutating call commits before returning, so a crash between calls
/// never loses acknowledged work.
pub trait WorkQueue {
    /// Returns the oldest pending item
    ///
    /// If nothing is pending and `default_url` is given, inserts an item for it and
    /// returns that instead. Fails with [`StorageError::QueueEmpty`] otherwise.
    fn next(&mut self, default_url: Option<&str>) -> StorageResult<QueueItem>;

    /// Inserts every candidate whose URL has never been queued before
    ///
    /// Duplicates inside `candidates` collapse to the first occurrence.
    ///
    /// # Returns
    ///
    /// The number of items actually inserted
    fn enqueue_unique(&mut self, candidates: &[NewQueueItem]) -> StorageResult<usize>;

    /// Marks an item as visited; marking an already-done item is a no-op
    fn mark_done(&mut self, item_id: i64) -> StorageResult<()>;

    /// Gets a queue item by ID
    fn get_item(&self, item_id: i64) -> StorageResult<Option<QueueItem>>;

    /// Counts every item ever queued
    fn count_items(&self) -> StorageResult<u64>;

    /// Counts items still waiting to be visited
    fn count_pending(&self) -> StorageResult<u64>;

    /// Counts visited items
    fn count_done(&self) -> StorageResult<u64>;
}

/// Persistent store of extracted page records
pub trait PageStore {
    /// Records the metadata extracted from a queue item's page
    ///
    /// A queue item has at most one record: saving again for the same item keeps
    /// the first record and returns its ID.
    ///
    /// # Returns
    ///
    /// The page record ID
    fn save(
        &mut self,
        queue_item_id: i64,
        title: &str,
        description: Option<&str>,
        top_words: &[TopWord],
    ) -> StorageResult<i64>;

    /// Returns every page record, in no particular order
    fn all(&self) -> StorageResult<Vec<PageRecord>>;

    /// Gets the page record for a queue item, if one was saved
    fn page_for_item(&self, queue_item_id: i64) -> StorageResult<Option<PageRecord>>;

    /// Counts page records
    fn count_pages(&self) -> StorageResult<u64>;
}
