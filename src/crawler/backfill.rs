//! Historical backfill over an id range
//!
//! The range is walked in fixed windows, strictly one after another. For each
//! window the ids already stored are skipped, the rest are fetched, and only
//! stories are kept; their comment trees are then handed to the tree crawler.
//! Comments found directly in the range are left for the crawler to reach
//! through their story.

use crate::crawler::batch::BatchFetcher;
use crate::crawler::stories_only;
use crate::crawler::tree::TreeCrawler;
use crate::storage::{with_store, SharedStore};
use crate::Result;
use std::collections::HashSet;

/// Totals for one backfill run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackfillReport {
    pub windows: usize,
    /// Ids that were already stored and not fetched
    pub skipped: usize,
    /// Ids requested upstream
    pub fetched: usize,
    pub stories_saved: usize,
    pub comments_saved: usize,
}

/// Range-based story backfill
pub struct BackfillWalker {
    store: SharedStore,
    fetcher: BatchFetcher,
    crawler: TreeCrawler,
    concurrency: usize,
}

impl BackfillWalker {
    pub fn new(
        store: SharedStore,
        fetcher: BatchFetcher,
        crawler: TreeCrawler,
        concurrency: usize,
    ) -> Self {
        Self {
            store,
            fetcher,
            crawler,
            concurrency,
        }
    }

    /// Backfills `[start, end)` in windows of `window_size` ids
    pub async fn backfill(&self, start: i64, end: i64, window_size: usize) -> Result<BackfillReport> {
        let window_size = window_size.max(1) as i64;
        let mut report = BackfillReport::default();

        tracing::info!(
            "Backfilling items [{}, {}) in windows of {}",
            start,
            end,
            window_size
        );

        let mut window_start = start;
        while window_start < end {
            let window_end = window_start.saturating_add(window_size).min(end);
            self.backfill_window(window_start, window_end, &mut report)
                .await?;
            window_start = window_end;
        }

        tracing::info!(
            "Backfill complete: {} windows, {} stories, {} comments saved ({} ids skipped)",
            report.windows,
            report.stories_saved,
            report.comments_saved,
            report.skipped
        );

        Ok(report)
    }

    async fn backfill_window(
        &self,
        start: i64,
        end: i64,
        report: &mut BackfillReport,
    ) -> Result<()> {
        let ids: Vec<i64> = (start..end).collect();

        // Skip ids already stored by an earlier window or run
        let known: HashSet<i64> = with_store(&self.store, |s| s.bulk_find_items(&ids))?
            .into_iter()
            .map(|item| item.id)
            .collect();

        let missing: Vec<i64> = ids.into_iter().filter(|id| !known.contains(id)).collect();

        // Comments in the range are reached later through their story
        let fetched = self.fetcher.fetch_many(&missing, self.concurrency).await;
        let stories = stories_only(fetched);
        let saved = with_store(&self.store, |s| s.upsert_items(&stories))?;
        // Only newly written stories seed the crawl
        let crawl = self.crawler.crawl_comments(&saved).await?;

        report.windows += 1;
        report.skipped += known.len();
        report.fetched += missing.len();
        report.stories_saved += saved.len();
        report.comments_saved += crawl.saved;

        let saved_ids: Vec<i64> = saved.iter().map(|item| item.id).collect();
        tracing::info!(
            "Window [{}, {}): saved {} stories {:?}, {} comments",
            start,
            end,
            saved.len(),
            saved_ids,
            crawl.saved
        );

        Ok(())
    }
}
