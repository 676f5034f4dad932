//! hn-ingest: Hacker News item graph ingestion
//!
//! This crate mirrors the Hacker News item graph (stories and their nested
//! comments) into a local SQLite store and keeps it current. It provides:
//! - A historical backfill over a range of item ids
//! - A live poller driven by the upstream "recently changed" list
//! - A breadth-first comment tree crawler shared by both
//! - Periodic top-stories snapshots

pub mod config;
pub mod crawler;
pub mod item;
pub mod output;
pub mod storage;

use thiserror::Error;

/// Main error type for ingestion operations
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Invalid JSON from {url}: {message}")]
    Decode { url: String, message: String },

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Startup failed: {0}")]
    Startup(String),
}

impl IngestError {
    /// Returns true if the error came from the upstream API rather than local state
    ///
    /// Upstream errors are recoverable for long-running loops. Everything else
    /// should stop the job, including `Reqwest`, which only comes from building
    /// the client.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            Self::Http { .. } | Self::Timeout { .. } | Self::Decode { .. }
        )
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for ingestion operations
pub type Result<T> = std::result::Result<T, IngestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use item::{Item, ItemType, RawItem, TopStoriesSnapshot};
pub use storage::{ItemStore, SharedStore, SqliteStorage};
