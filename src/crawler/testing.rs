//! In-process `ItemSource` and `ItemStore` doubles used by the unit tests

use crate::crawler::fetcher::{FetchResult, ItemSource, Updates};
use crate::item::{Item, ItemType, RawItem, TopStoriesSnapshot};
use crate::storage::{ItemStore, StorageError, StorageResult};
use crate::{IngestError, Result};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

pub(crate) fn story(id: i64, score: i64, kids: Vec<i64>) -> RawItem {
    RawItem {
        id,
        kind: Some("story".to_string()),
        by: Some("author".to_string()),
        time: Some(1_700_000_000 + id),
        score: Some(score),
        title: Some(format!("Story {}", id)),
        descendants: Some(kids.len() as i64),
        kids: Some(kids),
        ..Default::default()
    }
}

pub(crate) fn comment(id: i64, parent: i64, kids: Vec<i64>) -> RawItem {
    RawItem {
        id,
        kind: Some("comment".to_string()),
        by: Some("commenter".to_string()),
        time: Some(1_700_000_000 + id),
        parent: Some(parent),
        text: Some(format!("Comment {}", id)),
        kids: Some(kids),
        ..Default::default()
    }
}

/// Scriptable upstream that records every item id it is asked for
#[derive(Default)]
pub(crate) struct FakeSource {
    items: HashMap<i64, RawItem>,
    failing: HashSet<i64>,
    hanging: HashSet<i64>,
    top_stories: Vec<i64>,
    updates: Vec<i64>,
    max_item: Option<i64>,
    max_item_failures: AtomicU32,
    updates_failures: AtomicU32,
    updates_calls: AtomicU32,
    requested: Mutex<Vec<i64>>,
}

impl FakeSource {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_item(mut self, item: RawItem) -> Self {
        self.items.insert(item.id, item);
        self
    }

    pub(crate) fn with_items(mut self, items: impl IntoIterator<Item = RawItem>) -> Self {
        for item in items {
            self.items.insert(item.id, item);
        }
        self
    }

    /// Requests for `id` fail with a transient error
    pub(crate) fn failing(mut self, id: i64) -> Self {
        self.failing.insert(id);
        self
    }

    /// Requests for `id` never complete
    pub(crate) fn hanging(mut self, id: i64) -> Self {
        self.hanging.insert(id);
        self
    }

    pub(crate) fn with_top_stories(mut self, ids: Vec<i64>) -> Self {
        self.top_stories = ids;
        self
    }

    pub(crate) fn with_updates(mut self, ids: Vec<i64>) -> Self {
        self.updates = ids;
        self
    }

    pub(crate) fn with_max_item(mut self, id: i64) -> Self {
        self.max_item = Some(id);
        self
    }

    /// The next `times` max-item calls fail
    pub(crate) fn failing_max_item(self, times: u32) -> Self {
        self.max_item_failures.store(times, Ordering::SeqCst);
        self
    }

    /// The next `times` updates calls fail
    pub(crate) fn failing_updates(self, times: u32) -> Self {
        self.updates_failures.store(times, Ordering::SeqCst);
        self
    }

    /// Every item id requested so far, in request order
    pub(crate) fn requested(&self) -> Vec<i64> {
        self.requested.lock().unwrap().clone()
    }

    pub(crate) fn updates_calls(&self) -> u32 {
        self.updates_calls.load(Ordering::SeqCst)
    }

    fn take_failure(counter: &AtomicU32) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl ItemSource for FakeSource {
    async fn fetch_item(&self, id: i64) -> FetchResult {
        self.requested.lock().unwrap().push(id);
        tokio::task::yield_now().await;

        if self.hanging.contains(&id) {
            std::future::pending::<()>().await;
        }

        if self.failing.contains(&id) {
            return FetchResult::Failed {
                error: format!("connection reset fetching {}", id),
            };
        }

        match self.items.get(&id) {
            Some(item) => FetchResult::Item(item.clone()),
            None => FetchResult::Missing,
        }
    }

    async fn fetch_max_item(&self) -> Result<i64> {
        if Self::take_failure(&self.max_item_failures) {
            return Err(IngestError::Timeout {
                url: "fake://v0/maxitem.json".to_string(),
            });
        }

        self.max_item.ok_or_else(|| IngestError::Decode {
            url: "fake://v0/maxitem.json".to_string(),
            message: "null".to_string(),
        })
    }

    async fn fetch_top_stories(&self) -> Result<Vec<i64>> {
        Ok(self.top_stories.clone())
    }

    async fn fetch_updates(&self) -> Result<Updates> {
        self.updates_calls.fetch_add(1, Ordering::SeqCst);

        if Self::take_failure(&self.updates_failures) {
            return Err(IngestError::Timeout {
                url: "fake://v0/updates.json".to_string(),
            });
        }

        Ok(Updates {
            items: self.updates.clone(),
            profiles: Vec::new(),
        })
    }
}

/// Store that reads as empty and rejects every write, like a full disk
pub(crate) struct FailingStore;

impl FailingStore {
    fn disk_full() -> StorageError {
        StorageError::Sqlite(rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_FULL),
            Some("database or disk is full".to_string()),
        ))
    }
}

impl ItemStore for FailingStore {
    fn upsert_items(&mut self, _candidates: &[Option<RawItem>]) -> StorageResult<Vec<Item>> {
        Err(Self::disk_full())
    }

    fn get_item(&self, _id: i64) -> StorageResult<Option<Item>> {
        Ok(None)
    }

    fn bulk_find_items(&self, _ids: &[i64]) -> StorageResult<Vec<Item>> {
        Ok(Vec::new())
    }

    fn max_item_id(&self) -> StorageResult<Option<i64>> {
        Ok(None)
    }

    fn count_items(&self, _kind: ItemType) -> StorageResult<u64> {
        Ok(0)
    }

    fn record_top_stories(&mut self, _ids: &[i64]) -> StorageResult<TopStoriesSnapshot> {
        Err(Self::disk_full())
    }

    fn latest_top_stories(&self) -> StorageResult<Option<TopStoriesSnapshot>> {
        Ok(None)
    }

    fn count_top_story_snapshots(&self) -> StorageResult<u64> {
        Ok(0)
    }
}
