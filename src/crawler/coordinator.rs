//! Ingestion coordinator
//!
//! Wires the store, the upstream source and the ingestion components together
//! from configuration and exposes the three jobs: backfill, live polling and
//! top stories snapshots.

use crate::config::Config;
use crate::crawler::backfill::{BackfillReport, BackfillWalker};
use crate::crawler::batch::BatchFetcher;
use crate::crawler::fetcher::{resolve_max_item, HttpItemSource, ItemSource};
use crate::crawler::listener::LivePoller;
use crate::crawler::top_stories::TopStoriesSyncer;
use crate::crawler::tree::TreeCrawler;
use crate::item::TopStoriesSnapshot;
use crate::storage::{open_storage, shared, SharedStore};
use crate::Result;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Main ingestion coordinator
pub struct Coordinator {
    config: Config,
    store: SharedStore,
    source: Arc<dyn ItemSource>,
    backfill: BackfillWalker,
    listener: LivePoller,
    top_stories: TopStoriesSyncer,
}

impl Coordinator {
    /// Creates a coordinator over an existing store and source
    pub fn new(config: Config, store: SharedStore, source: Arc<dyn ItemSource>) -> Self {
        // All components share one fetcher and one store handle
        let fetcher = BatchFetcher::new(source.clone(), config.api.request_timeout());
        let crawler = TreeCrawler::new(store.clone(), fetcher.clone(), config.crawl.concurrency);

        let backfill = BackfillWalker::new(
            store.clone(),
            fetcher.clone(),
            crawler.clone(),
            config.backfill.concurrency,
        );
        let listener = LivePoller::new(
            store.clone(),
            fetcher.clone(),
            crawler,
            config.listener.clone(),
        );
        let top_stories =
            TopStoriesSyncer::new(store.clone(), fetcher, config.top_stories.concurrency);

        Self {
            config,
            store,
            source,
            backfill,
            listener,
            top_stories,
        }
    }

    /// Opens the configured SQLite database and connects to the configured API
    pub fn connect(config: Config) -> Result<Self> {
        let storage = open_storage(Path::new(&config.database.path))?;
        let source = HttpItemSource::from_config(&config.api)?;

        tracing::info!(
            "Using database {} and API {}",
            config.database.path,
            source.base_url()
        );

        Ok(Self::new(config, shared(storage), Arc::new(source)))
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    /// Resolves the latest upstream id; failure means ingestion must not start
    pub async fn latest_item_id(&self) -> Result<i64> {
        resolve_max_item(
            self.source.as_ref(),
            self.config.startup.max_item_retries,
            self.config.startup.retry_delay(),
        )
        .await
    }

    /// Backfills from `start` (or the configured start id) up to `end`
    ///
    /// Without an explicit or configured end, the range runs through the
    /// latest upstream id inclusive.
    pub async fn run_backfill(&self, start: Option<i64>, end: Option<i64>) -> Result<BackfillReport> {
        let start = start.unwrap_or(self.config.backfill.start_id);
        let configured_end = (self.config.backfill.end_id > 0).then_some(self.config.backfill.end_id);

        // Open-ended range: run through the newest upstream item
        let end = match end.or(configured_end) {
            Some(end) => end,
            None => self.latest_item_id().await? + 1,
        };

        self.backfill
            .backfill(start, end, self.config.backfill.window_size)
            .await
    }

    /// Runs the live poller until `cancel` fires
    ///
    /// The latest item id is resolved first so an unreachable API fails the
    /// job up front instead of looping.
    pub async fn run_listener(&self, cancel: CancellationToken) -> Result<()> {
        self.latest_item_id().await?;
        self.listener.run(cancel).await
    }

    /// Captures one top stories snapshot
    pub async fn sync_top_stories(&self) -> Result<TopStoriesSnapshot> {
        self.top_stories.sync_top_stories().await
    }

    /// Captures top stories once, or periodically when an interval is configured
    pub async fn run_top_stories(&self, cancel: CancellationToken) -> Result<()> {
        match self.config.top_stories.interval() {
            Some(interval) => self.top_stories.run_periodic(interval, cancel).await,
            None => self.sync_top_stories().await.map(|_| ()),
        }
    }
}
