use serde::{Deserialize, Serialize};
use std::fmt;

/// One entry of the host's action history, as the host ships it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub raw_text: Option<String>,
    #[serde(default, rename = "type")]
    pub action_type: Option<String>,
}

impl HistoryEntry {
    pub fn new(text: &str, action_type: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            raw_text: None,
            action_type: Some(action_type.to_string()),
        }
    }

    /// Visible text, falling back to the raw text when `text` is empty.
    pub fn visible_text(&self) -> &str {
        match self.text.as_deref() {
            Some(t) if !t.is_empty() => t,
            _ => self.raw_text.as_deref().unwrap_or(""),
        }
    }
}

/// What kind of turn a history entry represents.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionType {
    Do,
    Say,
    Story,
    Continue,
    Unknown,
    Other(String),
}

impl ActionType {
    pub fn from_tag(tag: &str) -> ActionType {
        match tag.trim().to_lowercase().as_str() {
            "do" => Self::Do,
            "say" => Self::Say,
            "story" => Self::Story,
            "continue" => Self::Continue,
            "" | "unknown" => Self::Unknown,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Do => "do",
            Self::Say => "say",
            Self::Story => "story",
            Self::Continue => "continue",
            Self::Unknown => "unknown",
            Self::Other(tag) => tag,
        }
    }

    /// Returns true for turns the player typed: `do`, `say` and `story`.
    pub fn is_player_action(&self) -> bool {
        matches!(self, Self::Do | Self::Say | Self::Story)
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An immutable copy of one history entry, taken at read time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionSnapshot {
    pub text: String,
    pub action_type: ActionType,
}

impl ActionSnapshot {
    pub fn empty() -> Self {
        Self {
            text: String::new(),
            action_type: ActionType::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visible_text_falls_back_to_raw() {
        let entry = HistoryEntry {
            text: Some(String::new()),
            raw_text: Some("> look".to_string()),
            action_type: None,
        };
        assert_eq!(entry.visible_text(), "> look");
        assert_eq!(HistoryEntry::default().visible_text(), "");
    }

    #[test]
    fn action_type_tags() {
        assert_eq!(ActionType::from_tag("DO"), ActionType::Do);
        assert_eq!(ActionType::from_tag(""), ActionType::Unknown);
        assert_eq!(ActionType::from_tag("see"), ActionType::Other("see".to_string()));
        assert_eq!(ActionType::Other("see".to_string()).as_str(), "see");
    }

    #[test]
    fn player_actions() {
        assert!(ActionType::Do.is_player_action());
        assert!(ActionType::Story.is_player_action());
        assert!(!ActionType::Continue.is_player_action());
        assert!(!ActionType::Unknown.is_player_action());
    }

    #[test]
    fn entry_deserializes_host_field_names() {
        let entry: HistoryEntry =
            ron::from_str(r#"(rawText: Some("> climb"), type: Some("unknown"))"#).unwrap();
        assert_eq!(entry.visible_text(), "> climb");
        assert_eq!(entry.action_type.as_deref(), Some("unknown"));
    }
}
