//! Top stories snapshots
//!
//! Records the current top stories ranking, restricted to stories the store
//! already holds. The syncer never ingests stories itself.

use crate::crawler::batch::BatchFetcher;
use crate::crawler::sleep_or_cancel;
use crate::item::{Item, TopStoriesSnapshot};
use crate::storage::{with_store, SharedStore};
use crate::Result;
use std::collections::HashSet;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub struct TopStoriesSyncer {
    store: SharedStore,
    fetcher: BatchFetcher,
    concurrency: usize,
}

impl TopStoriesSyncer {
    pub fn new(store: SharedStore, fetcher: BatchFetcher, concurrency: usize) -> Self {
        Self {
            store,
            fetcher,
            concurrency,
        }
    }

    /// Captures one snapshot of the top stories list
    pub async fn sync_top_stories(&self) -> Result<TopStoriesSnapshot> {
        let top_ids = self.fetcher.source().fetch_top_stories().await?;
        let fetched = self.fetcher.fetch_many(&top_ids, self.concurrency).await;

        // Keep the upstream ranking, minus anything that is not a story
        let story_ids: Vec<i64> = fetched
            .iter()
            .flatten()
            .filter(|raw| raw.is_story())
            .map(|raw| raw.id)
            .collect();

        let known: HashSet<i64> = with_store(&self.store, |s| s.bulk_find_items(&story_ids))?
            .into_iter()
            .filter(Item::is_story)
            .map(|item| item.id)
            .collect();

        // Stories are never ingested here, only matched against the store
        let ranked: Vec<i64> = story_ids
            .into_iter()
            .filter(|id| known.contains(id))
            .collect();

        let snapshot = with_store(&self.store, |s| s.record_top_stories(&ranked))?;

        tracing::info!(
            "Top stories synced: {} of {} listed stories recorded",
            snapshot.story_ids.len(),
            top_ids.len()
        );

        Ok(snapshot)
    }

    /// Captures a snapshot every `interval` until `cancel` fires
    ///
    /// Upstream failures skip that snapshot; storage failures are returned.
    pub async fn run_periodic(&self, interval: Duration, cancel: CancellationToken) -> Result<()> {
        while !cancel.is_cancelled() {
            match self.sync_top_stories().await {
                Ok(_) => {}
                Err(e) if e.is_upstream() => {
                    tracing::warn!("Top stories sync failed, will retry: {}", e)
                }
                Err(e) => return Err(e),
            }

            if !sleep_or_cancel(&cancel, interval).await {
                break;
            }
        }

        tracing::info!("Top stories sync stopped");
        Ok(())
    }
}
