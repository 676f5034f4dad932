//! Remote item source
//!
//! This module handles all HTTP requests to the Hacker News API, including:
//! - Building the HTTP client from the `[api]` configuration
//! - Item, max-item, top stories and updates endpoints
//! - Classifying per-item failures into a typed `FetchResult`
//! - Resolving the latest item id at startup with retries

use crate::config::ApiConfig;
use crate::item::RawItem;
use crate::{IngestError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

/// Result of fetching a single item
#[derive(Debug, Clone, PartialEq)]
pub enum FetchResult {
    /// The item payload
    Item(RawItem),

    /// Upstream answered `null`: the id is deleted or does not exist yet
    Missing,

    /// Network error, timeout, non-2xx status or malformed JSON
    Failed {
        /// Error description
        error: String,
    },
}

/// Body of `/v0/updates.json`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Updates {
    /// Recently changed item ids
    #[serde(default)]
    pub items: Vec<i64>,

    /// Recently changed user handles (not ingested)
    #[serde(default)]
    pub profiles: Vec<String>,
}

/// Read-only access to the upstream item graph
///
/// Implementations are stateless; retrying is left to the caller.
#[async_trait]
pub trait ItemSource: Send + Sync {
    /// Fetches one item; never fails, failures are reported in the result
    async fn fetch_item(&self, id: i64) -> FetchResult;

    /// Fetches the current largest item id
    async fn fetch_max_item(&self) -> Result<i64>;

    /// Fetches the current top stories ranking
    async fn fetch_top_stories(&self) -> Result<Vec<i64>>;

    /// Fetches the recently changed items and profiles
    async fn fetch_updates(&self) -> Result<Updates>;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The API configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &ApiConfig) -> std::result::Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(config.request_timeout())
        .connect_timeout(config.connect_timeout())
        .gzip(true)
        .brotli(true)
        .build()
}

/// `ItemSource` backed by the Hacker News Firebase API
#[derive(Debug, Clone)]
pub struct HttpItemSource {
    client: Client,
    base_url: Url,
}

impl HttpItemSource {
    /// Creates a source for the API rooted at `base_url`
    pub fn new(client: Client, base_url: &str) -> Result<Self> {
        // Without a trailing slash `join` would replace the last path segment
        let base_url = if base_url.ends_with('/') {
            Url::parse(base_url)?
        } else {
            Url::parse(&format!("{}/", base_url))?
        };

        Ok(Self { client, base_url })
    }

    /// Builds the client and source from configuration
    pub fn from_config(config: &ApiConfig) -> Result<Self> {
        let client = build_http_client(config)?;
        Self::new(client, &config.base_url)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.base_url.join(path)?;

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| classify_error(&url, e))?;

        // Non-2xx is a failure, not an empty item
        let response = response
            .error_for_status()
            .map_err(|e| classify_error(&url, e))?;

        let body = response
            .bytes()
            .await
            .map_err(|e| classify_error(&url, e))?;

        // `null` decodes to `None` for the item endpoint
        serde_json::from_slice(&body).map_err(|e| IngestError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })
    }
}

fn classify_error(url: &Url, error: reqwest::Error) -> IngestError {
    if error.is_timeout() {
        IngestError::Timeout {
            url: url.to_string(),
        }
    } else {
        IngestError::Http {
            url: url.to_string(),
            source: error,
        }
    }
}

#[async_trait]
impl ItemSource for HttpItemSource {
    async fn fetch_item(&self, id: i64) -> FetchResult {
        match self
            .get_json::<Option<RawItem>>(&format!("v0/item/{}.json", id))
            .await
        {
            Ok(Some(item)) => FetchResult::Item(item),
            Ok(None) => FetchResult::Missing,
            Err(e) => FetchResult::Failed {
                error: e.to_string(),
            },
        }
    }

    async fn fetch_max_item(&self) -> Result<i64> {
        self.get_json("v0/maxitem.json").await
    }

    async fn fetch_top_stories(&self) -> Result<Vec<i64>> {
        self.get_json("v0/topstories.json").await
    }

    async fn fetch_updates(&self) -> Result<Updates> {
        self.get_json("v0/updates.json").await
    }
}

/// Resolves the latest upstream item id, retrying transient failures
///
/// Ingestion must not start without it, so exhausting the attempts is an
/// `IngestError::Startup`.
pub async fn resolve_max_item(
    source: &dyn ItemSource,
    attempts: u32,
    delay: Duration,
) -> Result<i64> {
    let attempts = attempts.max(1);
    let mut last_error = String::new();

    for attempt in 1..=attempts {
        match source.fetch_max_item().await {
            Ok(id) => {
                tracing::info!("Latest item id: {}", id);
                return Ok(id);
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to fetch latest item id (attempt {}/{}): {}",
                    attempt,
                    attempts,
                    e
                );
                last_error = e.to_string();
            }
        }

        if attempt < attempts {
            tokio::time::sleep(delay).await;
        }
    }

    Err(IngestError::Startup(format!(
        "unable to fetch latest item id after {} attempts: {}",
        attempts, last_error
    )))
}
