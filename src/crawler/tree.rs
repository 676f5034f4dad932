//! Comment tree crawler
//!
//! Walks the comment trees under a set of roots one level at a time. Each
//! level is the union of the `kids` of the previous level; ids already in the
//! store are skipped, the rest are fetched in one batch and upserted, and the
//! newly saved items become the next level. A level only starts after the
//! previous level's upsert has committed, so a child is never fetched twice
//! in one crawl.
//!
//! The traversal keeps an explicit frontier instead of recursing, so thread
//! depth does not grow the call stack.

use crate::crawler::batch::BatchFetcher;
use crate::item::Item;
use crate::storage::{with_store, SharedStore};
use crate::Result;
use std::collections::HashSet;

/// Outcome of one crawl
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlReport {
    /// Ids fetched at each level, top level first
    pub levels: Vec<usize>,

    /// Items written across all levels
    pub saved: usize,
}

impl CrawlReport {
    /// Total ids fetched across all levels
    pub fn fetched(&self) -> usize {
        self.levels.iter().sum()
    }
}

/// Breadth-first comment crawler
#[derive(Clone)]
pub struct TreeCrawler {
    store: SharedStore,
    fetcher: BatchFetcher,
    concurrency: usize,
}

impl TreeCrawler {
    pub fn new(store: SharedStore, fetcher: BatchFetcher, concurrency: usize) -> Self {
        Self {
            store,
            fetcher,
            concurrency,
        }
    }

    /// Fetches and stores every not-yet-known descendant of `roots`
    ///
    /// Storage failures abort the crawl; fetch failures only drop the
    /// affected subtree for this run.
    pub async fn crawl_comments(&self, roots: &[Item]) -> Result<CrawlReport> {
        let mut report = CrawlReport::default();
        let mut level_ids = collect_kids(roots);

        while !level_ids.is_empty() {
            // Stable history is never fetched again
            let known: HashSet<i64> = with_store(&self.store, |s| s.bulk_find_items(&level_ids))?
                .into_iter()
                .map(|item| item.id)
                .collect();

            let pending: Vec<i64> = level_ids
                .into_iter()
                .filter(|id| !known.contains(id))
                .collect();

            if pending.is_empty() {
                break;
            }

            // The level is committed before its kids are looked at
            let fetched = self.fetcher.fetch_many(&pending, self.concurrency).await;
            let saved = with_store(&self.store, |s| s.upsert_items(&fetched))?;

            tracing::debug!(
                "Comment level {}: {} new ids, {} saved",
                report.levels.len() + 1,
                pending.len(),
                saved.len()
            );

            report.levels.push(pending.len());
            report.saved += saved.len();
            // Failed fetches are not saved, so their subtrees wait for a later run
            level_ids = collect_kids(&saved);
        }

        if report.saved > 0 {
            tracing::info!(
                "Crawled {} comments ({} fetched) across {} levels under {} roots",
                report.saved,
                report.fetched(),
                report.levels.len(),
                roots.len()
            );
        }

        Ok(report)
    }
}

/// Union of the kids of `items`, first occurrence order
fn collect_kids(items: &[Item]) -> Vec<i64> {
    let mut seen = HashSet::new();
    items
        .iter()
        .flat_map(|item| item.kids.iter().copied())
        .filter(|id| seen.insert(*id))
        .collect()
}
