//! Configuration module for hn-ingest
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every section is optional; missing keys fall back to defaults that target the
//! public Hacker News API.
//!
//! # Example
//!
//! ```no_run
//! use hn_ingest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("hn-ingest.toml")).unwrap();
//! println!("Backfill window: {}", config.backfill.window_size);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    ApiConfig, BackfillConfig, Config, CrawlConfig, DatabaseConfig, ListenerConfig, StartupConfig,
    TopStoriesConfig,
};

// Re-export parser functions
pub use parser::{load_config, parse_config};
