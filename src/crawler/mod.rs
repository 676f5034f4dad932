//! Ingestion engine
//!
//! This module contains the core ingestion logic, including:
//! - The remote item source and its HTTP implementation
//! - Windowed concurrent batch fetching
//! - Breadth-first comment tree crawling
//! - Range backfill, live polling and top stories snapshots
//! - Coordination of all of the above from configuration

mod backfill;
mod batch;
mod coordinator;
mod fetcher;
mod listener;
#[cfg(test)]
mod testing;
mod top_stories;
mod tree;

pub use backfill::{BackfillReport, BackfillWalker};
pub use batch::BatchFetcher;
pub use coordinator::Coordinator;
pub use fetcher::{
    build_http_client, resolve_max_item, FetchResult, HttpItemSource, ItemSource, Updates,
};
pub use listener::{LivePoller, PollReport};
pub use top_stories::TopStoriesSyncer;
pub use tree::{CrawlReport, TreeCrawler};

use crate::item::RawItem;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Keeps only story payloads, dropping failed fetches and every other type
pub(crate) fn stories_only(fetched: Vec<Option<RawItem>>) -> Vec<Option<RawItem>> {
    fetched
        .into_iter()
        .filter(|candidate| matches!(candidate, Some(raw) if raw.is_story()))
        .collect()
}

/// Sleeps for `duration` unless `cancel` fires first
///
/// Returns `false` if cancelled.
pub(crate) async fn sleep_or_cancel(cancel: &CancellationToken, duration: Duration) -> bool {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(duration) => true,
    }
}
