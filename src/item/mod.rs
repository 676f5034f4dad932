//! Item model for stories, comments, and top-story snapshots
//!
//! `RawItem` is the upstream payload as decoded from JSON. `Item` is the
//! normalized record the store persists; only stories and comments that pass
//! the ingestion filter ever become an `Item`.

mod raw;

pub use raw::RawItem;

use std::fmt;

/// Stories scoring below this are treated as spam and never stored
pub const MIN_STORY_SCORE: i64 = 3;

/// Kinds of upstream items that are ingested
///
/// Jobs, polls and poll options exist upstream but are rejected at ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemType {
    Story,
    Comment,
}

impl ItemType {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Story => "story",
            Self::Comment => "comment",
        }
    }

    /// Parses an upstream or database type string
    ///
    /// Returns `None` for types that are not ingested (job, poll, pollopt).
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "story" => Some(Self::Story),
            "comment" => Some(Self::Comment),
            _ => None,
        }
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_string())
    }
}

/// A story or comment as persisted in the item store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub id: i64,
    pub kind: ItemType,
    pub by: Option<String>,
    /// Creation time as a Unix timestamp
    pub time: i64,
    pub dead: bool,
    pub deleted: bool,
    /// Enclosing story or comment; `None` for stories
    pub parent: Option<i64>,
    /// Direct child comment ids in upstream order
    pub kids: Vec<i64>,
    pub url: Option<String>,
    pub title: Option<String>,
    pub text: Option<String>,
    pub score: Option<i64>,
    pub descendants: i64,
}

impl Item {
    pub fn is_story(&self) -> bool {
        self.kind == ItemType::Story
    }
}

/// One point-in-time capture of the top stories list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopStoriesSnapshot {
    /// Story ids in rank order (best first)
    pub story_ids: Vec<i64>,
    /// RFC 3339 timestamp shared by every row of the snapshot
    pub created_at: String,
}
