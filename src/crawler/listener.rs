//! Live update poller
//!
//! Polls `/v0/updates.json` on a fixed interval, ingests the updated stories
//! and crawls their new comments. Runs until its cancellation token fires.

use crate::config::ListenerConfig;
use crate::crawler::batch::BatchFetcher;
use crate::crawler::tree::TreeCrawler;
use crate::crawler::{sleep_or_cancel, stories_only};
use crate::storage::{with_store, SharedStore};
use crate::Result;
use tokio_util::sync::CancellationToken;

/// Totals for one poll cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollReport {
    /// Ids reported as changed upstream
    pub updated: usize,
    pub stories_saved: usize,
    pub comments_saved: usize,
}

/// Long-running live update loop
pub struct LivePoller {
    store: SharedStore,
    fetcher: BatchFetcher,
    crawler: TreeCrawler,
    config: ListenerConfig,
}

impl LivePoller {
    pub fn new(
        store: SharedStore,
        fetcher: BatchFetcher,
        crawler: TreeCrawler,
        config: ListenerConfig,
    ) -> Self {
        Self {
            store,
            fetcher,
            crawler,
            config,
        }
    }

    /// Runs poll cycles until `cancel` fires
    ///
    /// Upstream failures in a cycle are logged and the next cycle runs as
    /// usual. Storage failures stop the poller and are returned.
    pub async fn run(&self, cancel: CancellationToken) -> Result<()> {
        tracing::info!(
            "Live poller starting in {}s (interval {}s, batch size {})",
            self.config.warmup_secs,
            self.config.poll_interval_secs,
            self.config.batch_size
        );

        if !sleep_or_cancel(&cancel, self.config.warmup()).await {
            tracing::info!("Live poller cancelled during warm-up");
            return Ok(());
        }

        let mut cycles: u64 = 0;
        while !cancel.is_cancelled() {
            cycles += 1;

            match self.poll_once().await {
                Ok(report) => tracing::info!(
                    "Poll cycle {}: {} updated ids, {} stories and {} comments saved",
                    cycles,
                    report.updated,
                    report.stories_saved,
                    report.comments_saved
                ),
                Err(e) if e.is_upstream() => {
                    tracing::warn!("Poll cycle {} failed, will retry: {}", cycles, e)
                }
                Err(e) => {
                    tracing::error!("Poll cycle {} aborted: {}", cycles, e);
                    return Err(e);
                }
            }

            if !sleep_or_cancel(&cancel, self.config.poll_interval()).await {
                break;
            }
        }

        tracing::info!("Live poller stopped after {} cycles", cycles);
        Ok(())
    }

    /// Runs a single poll cycle
    pub async fn poll_once(&self) -> Result<PollReport> {
        let updates = self.fetcher.source().fetch_updates().await?;
        let batch_size = self.config.batch_size.max(1);

        let mut report = PollReport {
            updated: updates.items.len(),
            ..Default::default()
        };

        // Updated comments are picked up through their story's crawl
        for batch in updates.items.chunks(batch_size) {
            let fetched = self.fetcher.fetch_many(batch, batch_size).await;
            let stories = stories_only(fetched);
            let saved = with_store(&self.store, |s| s.upsert_items(&stories))?;
            let crawl = self.crawler.crawl_comments(&saved).await?;

            let saved_ids: Vec<i64> = saved.iter().map(|item| item.id).collect();
            tracing::debug!("Saved updated stories: {:?}", saved_ids);

            report.stories_saved += saved.len();
            report.comments_saved += crawl.saved;
        }

        Ok(report)
    }
}
