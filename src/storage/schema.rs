//! Database schema definitions
//!
//! Tables are created when absent and never altered afterwards.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Every URL ever discovered, visited or not
CREATE TABLE IF NOT EXISTS queue (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    url TEXT NOT NULL UNIQUE,
    parent_id INTEGER REFERENCES queue(id),
    done INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    last_edited TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_queue_pending ON queue(done, created_at, id);

-- Metadata for successfully visited pages
CREATE TABLE IF NOT EXISTS pages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    url_id INTEGER NOT NULL UNIQUE REFERENCES queue(id),
    title TEXT NOT NULL,
    description TEXT,
    created_at TEXT NOT NULL
);

-- Most frequent long words per page, rank 0 is the most frequent
CREATE TABLE IF NOT EXISTS page_words (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    page_id INTEGER NOT NULL REFERENCES pages(id),
    word TEXT NOT NULL,
    count INTEGER NOT NULL,
    rank INTEGER NOT NULL,
    UNIQUE(page_id, rank)
);

CREATE INDEX IF NOT EXISTS idx_page_words_page ON page_words(page_id);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_schema_initializes() {
        let conn = Connection::open_in_memory().unwrap();
        let result = initialize_schema(&conn);
        assert!(result.is_ok());
    }

    #[test]
    fn test_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();

        initialize_schema(&conn).unwrap();
        let result = initialize_schema(&conn);

        assert!(result.is_ok());
    }

    #[test]
    fn test_schema_keeps_existing_rows() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();
        conn.execute(
            "INSERT INTO queue (url, created_at, last_edited) VALUES ('https://a.test/', 'x', 'x')",
            [],
        )
        .unwrap();

        initialize_schema(&conn).unwrap();

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM queue", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_tables_exist_after_init() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();

        for table in ["queue", "pages", "page_words"] {
            let count: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
                    [table],
                    |row| row.get(0),
                )
                .unwrap();
            assert_eq!(count, 1, "Table {} should exist", table);
        }
    }
}
