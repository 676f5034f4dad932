//! Batch fetcher
//!
//! Turns a list of ids into payloads with bounded concurrency. Ids are split
//! into windows; every fetch in a window runs concurrently and the whole
//! window completes before the next one starts. A failed, missing or
//! timed-out fetch yields `None` at its position instead of failing the batch.

use crate::crawler::fetcher::{FetchResult, ItemSource};
use crate::item::RawItem;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;

/// Windowed concurrent fetcher over an `ItemSource`
#[derive(Clone)]
pub struct BatchFetcher {
    source: Arc<dyn ItemSource>,
    fetch_timeout: Duration,
}

impl BatchFetcher {
    /// Creates a fetcher whose individual requests give up after `fetch_timeout`
    pub fn new(source: Arc<dyn ItemSource>, fetch_timeout: Duration) -> Self {
        Self {
            source,
            fetch_timeout,
        }
    }

    /// The underlying source, for the list endpoints
    pub fn source(&self) -> &dyn ItemSource {
        self.source.as_ref()
    }

    /// Fetches `ids`, at most `concurrency` at a time
    ///
    /// The result has one entry per input id, in input order.
    pub async fn fetch_many(&self, ids: &[i64], concurrency: usize) -> Vec<Option<RawItem>> {
        let mut results = Vec::with_capacity(ids.len());

        // Each window finishes before the next one is started
        for window in ids.chunks(concurrency.max(1)) {
            let fetches = window.iter().map(|&id| self.fetch_one(id));
            results.extend(join_all(fetches).await);
        }

        let failed = results.iter().filter(|r| r.is_none()).count();
        if failed > 0 {
            tracing::debug!("{} of {} fetches returned no item", failed, ids.len());
        }

        results
    }

    async fn fetch_one(&self, id: i64) -> Option<RawItem> {
        match tokio::time::timeout(self.fetch_timeout, self.source.fetch_item(id)).await {
            Ok(FetchResult::Item(item)) => Some(item),
            Ok(FetchResult::Missing) => {
                tracing::trace!("Item {} is null upstream", id);
                None
            }
            Ok(FetchResult::Failed { error }) => {
                tracing::debug!("Fetch failed for item {}: {}", id, error);
                None
            }
            Err(_) => {
                tracing::debug!("Fetch timed out for item {}", id);
                None
            }
        }
    }
}
