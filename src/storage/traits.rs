//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::item::{Item, ItemType, RawItem, TopStoriesSnapshot};
use thiserror::Error;

/// Errors that can occur during storage operations
///
/// All of these are fatal for the operation that hit them: a write that
/// cannot be committed must not be silently dropped.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store lock poisoned")]
    LockPoisoned,
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for item store implementations
///
/// The store exclusively owns persisted state. Every write method is a
/// single transaction.
pub trait ItemStore {
    // ===== Items =====

    /// Filters, normalizes and upserts a batch of fetched payloads
    ///
    /// `None` entries (failed fetches), payloads without a supported type and
    /// stories below the score threshold are skipped. Survivors are written
    /// with insert-or-overwrite semantics keyed by id.
    ///
    /// # Returns
    ///
    /// The items that were written. Empty input never touches the database.
    fn upsert_items(&mut self, candidates: &[Option<RawItem>]) -> StorageResult<Vec<Item>>;

    /// Gets an item by id
    fn get_item(&self, id: i64) -> StorageResult<Option<Item>>;

    /// Returns the stored items among `ids`
    fn bulk_find_items(&self, ids: &[i64]) -> StorageResult<Vec<Item>>;

    /// Gets the highest stored item id
    fn max_item_id(&self) -> StorageResult<Option<i64>>;

    /// Counts stored items of one type
    fn count_items(&self, kind: ItemType) -> StorageResult<u64>;

    // ===== Top Stories =====

    /// Appends one snapshot of the top stories list
    ///
    /// All rows share one creation timestamp. Repeated ids keep their first
    /// position.
    fn record_top_stories(&mut self, ids: &[i64]) -> StorageResult<TopStoriesSnapshot>;

    /// Gets the most recent top stories snapshot, in rank order
    fn latest_top_stories(&self) -> StorageResult<Option<TopStoriesSnapshot>>;

    /// Counts recorded snapshots
    fn count_top_story_snapshots(&self) -> StorageResult<u64>;
}
