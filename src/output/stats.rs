//! Statistics generation from the item store
//!
//! This module provides functionality for extracting and displaying
//! ingestion statistics from the storage layer.

use crate::item::{ItemType, TopStoriesSnapshot};
use crate::storage::ItemStore;
use crate::Result;

/// Item store statistics summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreStatistics {
    /// Number of stored stories
    pub stories: u64,

    /// Number of stored comments
    pub comments: u64,

    /// Highest stored item id
    pub max_item_id: Option<i64>,

    /// Number of top stories snapshots recorded
    pub snapshots: u64,

    /// The most recent top stories snapshot
    pub latest_snapshot: Option<TopStoriesSnapshot>,
}

impl StoreStatistics {
    pub fn total_items(&self) -> u64 {
        self.stories + self.comments
    }
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to query
///
/// # Returns
///
/// * `Ok(StoreStatistics)` - Successfully loaded statistics
/// * `Err(IngestError)` - Failed to query statistics
pub fn load_statistics(storage: &dyn ItemStore) -> Result<StoreStatistics> {
    Ok(StoreStatistics {
        stories: storage.count_items(ItemType::Story)?,
        comments: storage.count_items(ItemType::Comment)?,
        max_item_id: storage.max_item_id()?,
        snapshots: storage.count_top_story_snapshots()?,
        latest_snapshot: storage.latest_top_stories()?,
    })
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &StoreStatistics) {
    println!("=== Item Store Statistics ===\n");

    println!("Items:");
    println!("  Total: {}", stats.total_items());
    println!("  Stories: {}", stats.stories);
    println!("  Comments: {}", stats.comments);
    match stats.max_item_id {
        Some(id) => println!("  Highest item id: {}", id),
        None => println!("  Highest item id: -"),
    }
    println!();

    println!("Top Stories Snapshots: {}", stats.snapshots);
    if let Some(snapshot) = &stats.latest_snapshot {
        println!(
            "  Latest ({}): {} stories",
            snapshot.created_at,
            snapshot.story_ids.len()
        );
        for (rank, id) in snapshot.story_ids.iter().take(10).enumerate() {
            println!("    {:>2}. {}", rank + 1, id);
        }
    }
}
