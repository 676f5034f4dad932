//! Storage module for persisting ingested items
//!
//! This module handles all database operations for the ingester, including:
//! - SQLite database initialization and schema management
//! - Idempotent bulk upserts of stories and comments
//! - Point and bulk lookups used for de-duplication
//! - The append-only top stories log

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{ItemStore, StorageError, StorageResult};

use std::path::Path;
use std::sync::{Arc, Mutex};

/// Store handle shared by the async ingestion components
///
/// The lock is only ever held for one synchronous store call; use
/// [`with_store`] rather than locking directly.
pub type SharedStore = Arc<Mutex<dyn ItemStore + Send>>;

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

/// Wraps a store so it can be handed to the ingestion components
pub fn shared<S: ItemStore + Send + 'static>(store: S) -> SharedStore {
    Arc::new(Mutex::new(store))
}

/// Runs one operation against the shared store
///
/// The guard is dropped before this returns, so callers never hold the store
/// across an `.await`.
pub fn with_store<T>(
    store: &SharedStore,
    op: impl FnOnce(&mut (dyn ItemStore + Send)) -> StorageResult<T>,
) -> StorageResult<T> {
    let mut guard = store.lock().map_err(|_| StorageError::LockPoisoned)?;
    op(&mut *guard)
}
