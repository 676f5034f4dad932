use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for hn-ingest
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    pub backfill: BackfillConfig,
    pub crawl: CrawlConfig,
    pub listener: ListenerConfig,
    #[serde(rename = "top-stories")]
    pub top_stories: TopStoriesConfig,
    pub startup: StartupConfig,
}

/// Upstream API configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ApiConfig {
    /// Root of the API; `v0/...` paths are joined onto it
    pub base_url: String,

    /// Timeout for a single request (milliseconds)
    pub request_timeout_ms: u64,

    /// Timeout for establishing a connection (milliseconds)
    pub connect_timeout_ms: u64,

    /// User-Agent header sent with every request
    pub user_agent: String,
}

impl ApiConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://hacker-news.firebaseio.com".to_string(),
            request_timeout_ms: 10_000,
            connect_timeout_ms: 5_000,
            user_agent: format!("hn-ingest/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct DatabaseConfig {
    /// Path to the SQLite database file
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "./hn.db".to_string(),
        }
    }
}

/// Historical backfill configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct BackfillConfig {
    /// First id to visit (inclusive)
    pub start_id: i64,

    /// Id to stop at (exclusive); 0 means "ask the API for the latest id"
    pub end_id: i64,

    /// Number of ids examined per window
    pub window_size: usize,

    /// Number of concurrent fetches inside a window
    pub concurrency: usize,
}

impl Default for BackfillConfig {
    fn default() -> Self {
        Self {
            start_id: 0,
            end_id: 0,
            window_size: 1000,
            concurrency: 100,
        }
    }
}

/// Comment tree crawl configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CrawlConfig {
    /// Number of concurrent fetches per comment layer window
    pub concurrency: usize,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self { concurrency: 200 }
    }
}

/// Live update poller configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ListenerConfig {
    /// Delay before the first poll (seconds)
    pub warmup_secs: u64,

    /// Delay between poll cycles (seconds)
    pub poll_interval_secs: u64,

    /// Number of updated ids fetched together
    pub batch_size: usize,
}

impl ListenerConfig {
    pub fn warmup(&self) -> Duration {
        Duration::from_secs(self.warmup_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            warmup_secs: 30,
            poll_interval_secs: 60,
            batch_size: 20,
        }
    }
}

/// Top stories snapshot configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct TopStoriesConfig {
    /// Seconds between snapshots; 0 runs a single sync and exits
    pub interval_secs: u64,

    /// Number of concurrent fetches when resolving the list
    pub concurrency: usize,
}

impl TopStoriesConfig {
    /// Interval between snapshots, or `None` for a one-shot sync
    pub fn interval(&self) -> Option<Duration> {
        (self.interval_secs > 0).then(|| Duration::from_secs(self.interval_secs))
    }
}

impl Default for TopStoriesConfig {
    fn default() -> Self {
        Self {
            interval_secs: 0,
            concurrency: 100,
        }
    }
}

/// Startup behaviour for resolving the latest upstream id
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct StartupConfig {
    /// Attempts made for `/v0/maxitem.json` before giving up
    pub max_item_retries: u32,

    /// Delay between attempts (milliseconds)
    pub retry_delay_ms: u64,
}

impl StartupConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

impl Default for StartupConfig {
    fn default() -> Self {
        Self {
            max_item_retries: 3,
            retry_delay_ms: 5_000,
        }
    }
}
