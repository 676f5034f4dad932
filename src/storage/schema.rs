//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the item store.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Stories and comments, keyed by upstream id
CREATE TABLE IF NOT EXISTS item (
    id INTEGER PRIMARY KEY,
    "type" TEXT NOT NULL,
    "by" TEXT,
    time INTEGER NOT NULL,
    dead INTEGER NOT NULL DEFAULT 0,
    deleted INTEGER NOT NULL DEFAULT 0,
    parent INTEGER,
    kids TEXT NOT NULL DEFAULT '[]',
    url TEXT,
    title TEXT,
    text TEXT,
    score INTEGER,
    descendants INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_item_parent ON item(parent);
CREATE INDEX IF NOT EXISTS idx_item_type ON item("type");

-- Append-only log of top stories snapshots
CREATE TABLE IF NOT EXISTS top_stories (
    story_item_id INTEGER NOT NULL,
    created_at TEXT NOT NULL,
    rank INTEGER NOT NULL,
    PRIMARY KEY (story_item_id, created_at)
);

CREATE INDEX IF NOT EXISTS idx_top_stories_created ON top_stories(created_at);
"#;

/// Column list shared by every item query, in `row_to_item` order
pub const ITEM_COLUMNS: &str = r#"id, "type", "by", time, dead, deleted, parent, kids, url, title, text, score, descendants"#;

/// Initializes the database schema
///
/// Creates all tables and indexes if they don't exist.
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
