//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the ItemStore trait.

use crate::item::{Item, ItemType, RawItem, TopStoriesSnapshot};
use crate::storage::schema::{initialize_schema, ITEM_COLUMNS};
use crate::storage::traits::{ItemStore, StorageResult};
use chrono::{SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Upper bound on bound parameters per `IN (...)` query
const LOOKUP_CHUNK: usize = 500;

const UPSERT_SQL: &str = r#"
INSERT INTO item (id, "type", "by", time, dead, deleted, parent, kids, url, title, text, score, descendants)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
ON CONFLICT(id) DO UPDATE SET
    "type" = excluded."type",
    "by" = excluded."by",
    time = excluded.time,
    dead = excluded.dead,
    deleted = excluded.deleted,
    parent = excluded.parent,
    kids = excluded.kids,
    url = excluded.url,
    title = excluded.title,
    text = excluded.text,
    score = excluded.score,
    descendants = excluded.descendants
"#;

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
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
        let conn = Connection::open(path)?;

        // Configure SQLite for concurrent readers and bulk writes
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
            PRAGMA mmap_size = 268435456;
        ",
        )?;

        // Initialize schema
        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

/// Applies the ingestion filter to a batch of payloads
///
/// When the same id appears more than once the last payload wins, keeping
/// the position of its first appearance.
fn normalize_candidates(candidates: &[Option<RawItem>]) -> Vec<Item> {
    let mut items: Vec<Item> = Vec::new();
    let mut positions: HashMap<i64, usize> = HashMap::new();

    // Last payload wins, first position is kept
    for item in candidates.iter().flatten().filter_map(RawItem::to_item) {
        match positions.get(&item.id) {
            Some(&pos) => items[pos] = item,
            None => {
                positions.insert(item.id, items.len());
                items.push(item);
            }
        }
    }

    items
}

fn row_to_item(row: &Row<'_>) -> rusqlite::Result<Item> {
    let kind_str: String = row.get(1)?;
    let kind = ItemType::from_db_string(&kind_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            1,
            Type::Text,
            format!("unknown item type '{}'", kind_str).into(),
        )
    })?;

    let kids_json: String = row.get(7)?;
    let kids: Vec<i64> = serde_json::from_str(&kids_json)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(7, Type::Text, Box::new(e)))?;

    Ok(Item {
        id: row.get(0)?,
        kind,
        by: row.get(2)?,
        time: row.get(3)?,
        dead: row.get(4)?,
        deleted: row.get(5)?,
        parent: row.get(6)?,
        kids,
        url: row.get(8)?,
        title: row.get(9)?,
        text: row.get(10)?,
        score: row.get(11)?,
        descendants: row.get(12)?,
    })
}

impl ItemStore for SqliteStorage {
    // ===== Items =====

    fn upsert_items(&mut self, candidates: &[Option<RawItem>]) -> StorageResult<Vec<Item>> {
        // Drop nulls, unsupported types and spam before touching the database
        let items = normalize_candidates(candidates);
        if items.is_empty() {
            return Ok(items);
        }

        // One transaction per batch; on conflict every mutable column is replaced
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached(UPSERT_SQL)?;
            for item in &items {
                let kids = serde_json::to_string(&item.kids)?;
                stmt.execute(params![
                    item.id,
                    item.kind.to_db_string(),
                    item.by,
                    item.time,
                    item.dead,
                    item.deleted,
                    item.parent,
                    kids,
                    item.url,
                    item.title,
                    item.text,
                    item.score,
                    item.descendants,
                ])?;
            }
        }
        tx.commit()?;

        Ok(items)
    }

    fn get_item(&self, id: i64) -> StorageResult<Option<Item>> {
        let sql = format!("SELECT {} FROM item WHERE id = ?1", ITEM_COLUMNS);
        let item = self
            .conn
            .query_row(&sql, params![id], row_to_item)
            .optional()?;
        Ok(item)
    }

    fn bulk_find_items(&self, ids: &[i64]) -> StorageResult<Vec<Item>> {
        let mut seen = HashSet::new();
        let unique: Vec<i64> = ids.iter().copied().filter(|id| seen.insert(*id)).collect();

        // Stay under SQLite's bound parameter limit
        let mut items = Vec::new();
        for chunk in unique.chunks(LOOKUP_CHUNK) {
            let placeholders = vec!["?"; chunk.len()].join(", ");
            let sql = format!(
                "SELECT {} FROM item WHERE id IN ({})",
                ITEM_COLUMNS, placeholders
            );

            let mut stmt = self.conn.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(chunk.iter()), row_to_item)?;
            for row in rows {
                items.push(row?);
            }
        }

        Ok(items)
    }

    fn max_item_id(&self) -> StorageResult<Option<i64>> {
        let max: Option<i64> = self
            .conn
            .query_row("SELECT MAX(id) FROM item", [], |row| row.get(0))?;
        Ok(max)
    }

    fn count_items(&self, kind: ItemType) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            r#"SELECT COUNT(*) FROM item WHERE "type" = ?1"#,
            params![kind.to_db_string()],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    // ===== Top Stories =====

    fn record_top_stories(&mut self, ids: &[i64]) -> StorageResult<TopStoriesSnapshot> {
        // Every row of one snapshot shares this timestamp
        let created_at = Utc::now().to_rfc3339_opts(SecondsFormat::Nanos, true);

        // Keep the first rank of a repeated id
        let mut seen = HashSet::new();
        let story_ids: Vec<i64> = ids.iter().copied().filter(|id| seen.insert(*id)).collect();

        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO top_stories (story_item_id, created_at, rank) VALUES (?1, ?2, ?3)",
            )?;
            for (rank, id) in story_ids.iter().enumerate() {
                stmt.execute(params![id, created_at, rank as i64])?;
            }
        }
        tx.commit()?;

        Ok(TopStoriesSnapshot {
            story_ids,
            created_at,
        })
    }

    fn latest_top_stories(&self) -> StorageResult<Option<TopStoriesSnapshot>> {
        let created_at: Option<String> = self
            .conn
            .query_row(
                "SELECT created_at FROM top_stories ORDER BY created_at DESC LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()?;

        // No snapshot recorded yet
        let Some(created_at) = created_at else {
            return Ok(None);
        };

        let mut stmt = self.conn.prepare(
            "SELECT story_item_id FROM top_stories WHERE created_at = ?1 ORDER BY rank",
        )?;
        let story_ids = stmt
            .query_map(params![created_at], |row| row.get(0))?
            .collect::<Result<Vec<i64>, _>>()?;

        Ok(Some(TopStoriesSnapshot {
            story_ids,
            created_at,
        }))
    }

    fn count_top_story_snapshots(&self) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(DISTINCT created_at) FROM top_stories",
            [],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}
