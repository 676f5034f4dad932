use crate::item::{Item, ItemType, MIN_STORY_SCORE};
use serde::{Deserialize, Serialize};

/// An item payload exactly as returned by `/v0/item/{id}.json`
///
/// Every field except `id` may be absent upstream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawItem {
    pub id: i64,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dead: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kids: Option<Vec<i64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub descendants: Option<i64>,
}

impl RawItem {
    /// Returns the ingested type of this payload, if it has one
    pub fn item_type(&self) -> Option<ItemType> {
        self.kind.as_deref().and_then(ItemType::from_db_string)
    }

    pub fn is_story(&self) -> bool {
        self.item_type() == Some(ItemType::Story)
    }

    /// Applies the ingestion filter and normalizes the payload
    ///
    /// Returns `None` when the type is missing or unsupported, or when the
    /// item is a story scoring below [`MIN_STORY_SCORE`] (a missing score
    /// counts as zero). Comments pass regardless of score.
    pub fn to_item(&self) -> Option<Item> {
        let kind = self.item_type()?;

        if kind == ItemType::Story && self.score.unwrap_or(0) < MIN_STORY_SCORE {
            return None;
        }

        Some(Item {
            id: self.id,
            kind,
            by: self.by.clone(),
            time: self.time.unwrap_or(0),
            dead: self.dead.unwrap_or(false),
            deleted: self.deleted.unwrap_or(false),
            parent: self.parent,
            kids: self.kids.clone().unwrap_or_default(),
            url: self.url.clone(),
            title: self.title.clone(),
            text: self.text.clone(),
            score: self.score,
            descendants: self.descendants.unwrap_or(0),
        })
    }
}
