//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the `WorkQueue` and
//! `PageStore` traits. Each mutating call runs in its own transaction.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{PageStore, StorageError, StorageResult, WorkQueue};
use crate::storage::{NewQueueItem, PageRecord, QueueItem, TopWord};
use chrono::{SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

const QUEUE_COLUMNS: &str = "id, url, parent_id, done, created_at, last_edited";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// Missing parent directories are created, then the schema is applied.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;

        // Durability over speed: a committed queue change must survive a crash
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = FULL;
            PRAGMA foreign_keys = ON;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn oldest_pending(&self) -> StorageResult<Option<QueueItem>> {
        let item = self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM queue WHERE done = 0 ORDER BY created_at ASC, id ASC LIMIT 1",
                    QUEUE_COLUMNS
                ),
                [],
                item_from_row,
            )
            .optional()?;
        Ok(item)
    }

    fn load_words(&self, page_id: i64) -> StorageResult<Vec<TopWord>> {
        let mut stmt = self
            .conn
            .prepare("SELECT word, count FROM page_words WHERE page_id = ?1 ORDER BY rank ASC")?;

        let words = stmt
            .query_map(params![page_id], |row| {
                Ok(TopWord {
                    word: row.get(0)?,
                    count: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(words)
    }

    fn count(&self, sql: &str) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(sql, [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn item_from_row(row: &Row<'_>) -> rusqlite::Result<QueueItem> {
    Ok(QueueItem {
        id: row.get(0)?,
        url: row.get(1)?,
        parent_id: row.get(2)?,
        done: row.get(3)?,
        created_at: row.get(4)?,
        last_edited: row.get(5)?,
    })
}

fn page_from_row(row: &Row<'_>) -> rusqlite::Result<PageRecord> {
    Ok(PageRecord {
        id: row.get(0)?,
        url_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        top_words: Vec::new(),
        created_at: row.get(4)?,
    })
}

impl WorkQueue for SqliteStorage {
    fn next(&mut self, default_url: Option<&str>) -> StorageResult<QueueItem> {
        if let Some(item) = self.oldest_pending()? {
            tracing::debug!("Returning queued URL: {} ({})", item.url, item.id);
            return Ok(item);
        }

        let Some(url) = default_url else {
            return Err(StorageError::QueueEmpty);
        };

        let tx = self.conn.transaction()?;
        let now = now();
        let inserted = tx.execute(
            "INSERT OR IGNORE INTO queue (url, parent_id, done, created_at, last_edited)
             VALUES (?1, NULL, 0, ?2, ?2)",
            params![url, now],
        )?;

        // Nothing is pending, so an existing row for the default is already done
        if inserted == 0 {
            tracing::debug!("Default URL {} was already visited", url);
            return Err(StorageError::QueueEmpty);
        }

        let id = tx.last_insert_rowid();
        let item = tx.query_row(
            &format!("SELECT {} FROM queue WHERE id = ?1", QUEUE_COLUMNS),
            params![id],
            item_from_row,
        )?;
        tx.commit()?;

        tracing::debug!("Returning default URL: {} ({})", item.url, item.id);
        Ok(item)
    }

    fn enqueue_unique(&mut self, candidates: &[NewQueueItem]) -> StorageResult<usize> {
        let tx = self.conn.transaction()?;
        let now = now();
        let mut inserted = 0;

        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO queue (url, parent_id, done, created_at, last_edited)
                 VALUES (?1, ?2, 0, ?3, ?3)",
            )?;

            for candidate in candidates {
                let rows = stmt.execute(params![candidate.url, candidate.parent_id, now])?;
                if rows == 0 {
                    tracing::debug!("{} already exists in queue, skipping", candidate.url);
                }
                inserted += rows;
            }
        }

        tx.commit()?;
        Ok(inserted)
    }

    fn mark_done(&mut self, item_id: i64) -> StorageResult<()> {
        let tx = self.conn.transaction()?;

        let done: Option<bool> = tx
            .query_row(
                "SELECT done FROM queue WHERE id = ?1",
                params![item_id],
                |row| row.get(0),
            )
            .optional()?;

        match done {
            None => return Err(StorageError::ItemNotFound(item_id)),
            Some(true) => tracing::debug!("Item {} already done", item_id),
            Some(false) => {
                tracing::debug!("Marking as done: {}", item_id);
                tx.execute(
                    "UPDATE queue SET done = 1, last_edited = ?1 WHERE id = ?2",
                    params![now(), item_id],
                )?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    fn get_item(&self, item_id: i64) -> StorageResult<Option<QueueItem>> {
        let item = self
            .conn
            .query_row(
                &format!("SELECT {} FROM queue WHERE id = ?1", QUEUE_COLUMNS),
                params![item_id],
                item_from_row,
            )
            .optional()?;
        Ok(item)
    }

    fn count_items(&self) -> StorageResult<u64> {
        self.count("SELECT COUNT(*) FROM queue")
    }

    fn count_pending(&self) -> StorageResult<u64> {
        self.count("SELECT COUNT(*) FROM queue WHERE done = 0")
    }

    fn count_done(&self) -> StorageResult<u64> {
        self.count("SELECT COUNT(*) FROM queue WHERE done = 1")
    }
}

impl PageStore for SqliteStorage {
    fn save(
        &mut self,
        queue_item_id: i64,
        title: &str,
        description: Option<&str>,
        top_words: &[TopWord],
    ) -> StorageResult<i64> {
        if title.trim().is_empty() {
            return Err(StorageError::PageWrite(format!(
                "empty title for queue item {}",
                queue_item_id
            )));
        }

        let tx = self.conn.transaction()?;

        let existing: Option<i64> = tx
            .query_row(
                "SELECT id FROM pages WHERE url_id = ?1",
                params![queue_item_id],
                |row| row.get(0),
            )
            .optional()?;

        if let Some(page_id) = existing {
            tracing::debug!(
                "Queue item {} already has page {}, keeping it",
                queue_item_id,
                page_id
            );
            return Ok(page_id);
        }

        tx.execute(
            "INSERT INTO pages (url_id, title, description, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![queue_item_id, title, description, now()],
        )?;
        let page_id = tx.last_insert_rowid();

        {
            let mut stmt = tx.prepare(
                "INSERT INTO page_words (page_id, word, count, rank) VALUES (?1, ?2, ?3, ?4)",
            )?;
            for (rank, word) in top_words.iter().enumerate() {
                stmt.execute(params![page_id, word.word, word.count, rank as i64])?;
            }
        }

        tx.commit()?;

        tracing::debug!("Stored page {} for queue item {}: {}", page_id, queue_item_id, title);
        Ok(page_id)
    }

    fn all(&self) -> StorageResult<Vec<PageRecord>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, url_id, title, description, created_at FROM pages ORDER BY id ASC")?;

        let mut pages = stmt
            .query_map([], page_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        for page in &mut pages {
            page.top_words = self.load_words(page.id)?;
        }

        Ok(pages)
    }

    fn page_for_item(&self, queue_item_id: i64) -> StorageResult<Option<PageRecord>> {
        let page = self
            .conn
            .query_row(
                "SELECT id, url_id, title, description, created_at FROM pages WHERE url_id = ?1",
                params![queue_item_id],
                page_from_row,
            )
            .optional()?;

        match page {
            Some(mut page) => {
                page.top_words = self.load_words(page.id)?;
                Ok(Some(page))
            }
            None => Ok(None),
        }
    }

    fn count_pages(&self) -> StorageResult<u64> {
        self.count("SELECT COUNT(*) FROM pages")
    }
}
