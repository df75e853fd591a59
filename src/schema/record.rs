use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Newtype wrapper for record IDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordId(pub u64);

/// A tagged, titled text document held by the host: the settings record,
/// a character's Class or Race sheet, or any unrelated story card.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryRecord {
    pub id: RecordId,
    #[serde(rename = "type")]
    pub record_type: String,
    pub title: String,
    #[serde(default)]
    pub keys: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub description: String,
    pub updated_at: DateTime<Utc>,
}

impl StoryRecord {
    /// Case-insensitive exact title match.
    pub fn has_title(&self, title: &str) -> bool {
        self.title.trim().to_lowercase() == title.trim().to_lowercase()
    }

    /// Case-insensitive type tag match.
    pub fn has_type(&self, record_type: &str) -> bool {
        self.record_type.trim().eq_ignore_ascii_case(record_type.trim())
    }
}
