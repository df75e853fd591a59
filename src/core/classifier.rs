/// Decides whether the newest history entry is a player action worth
/// resolving.

use regex::Regex;
use std::sync::LazyLock;

use crate::core::store::HistoryReader;
use crate::schema::history::{ActionSnapshot, ActionType};

static LEADING_PROMPT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*>").expect("valid regex"));
static SPEECH_VERB_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(says?|said)\b").expect("valid regex"));
static CONTINUE_PROMPT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)please select\s*"continue""#).expect("valid regex"));

pub struct ActionClassifier<'a> {
    history: &'a dyn HistoryReader,
}

impl<'a> ActionClassifier<'a> {
    pub fn new(history: &'a dyn HistoryReader) -> Self {
        Self { history }
    }

    /// Copies the entry `look_back` turns before the newest. An empty
    /// history reads as empty text of unknown type.
    pub fn read_last_action(&self, look_back: usize) -> ActionSnapshot {
        match self.history.latest(look_back) {
            Some(entry) => ActionSnapshot {
                text: entry.visible_text().to_string(),
                action_type: entry
                    .action_type
                    .as_deref()
                    .map(ActionType::from_tag)
                    .unwrap_or(ActionType::Unknown),
            },
            None => ActionSnapshot::empty(),
        }
    }

    /// The entry's own type when it has one, else a guess from its text.
    pub fn classify(&self, look_back: usize, fallback_text: Option<&str>) -> ActionType {
        let action = self.read_last_action(look_back);
        if action.action_type != ActionType::Unknown {
            tracing::debug!(action_type = %action.action_type, "explicit action type");
            return action.action_type;
        }
        let guessed = classify_text(&action.text, fallback_text);
        tracing::debug!(action_type = %guessed, "heuristic action type");
        guessed
    }
}

/// Text heuristics applied when history metadata is missing.
pub fn classify_text(text: &str, fallback_text: Option<&str>) -> ActionType {
    if LEADING_PROMPT_RE.is_match(text) {
        return ActionType::Do;
    }
    if SPEECH_VERB_RE.is_match(text) && text.contains('"') {
        return ActionType::Say;
    }
    if CONTINUE_PROMPT_RE.is_match(text) {
        return ActionType::Continue;
    }
    if fallback_text.is_some_and(|f| LEADING_PROMPT_RE.is_match(f)) {
        return ActionType::Do;
    }
    ActionType::Unknown
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::history::HistoryEntry;

    fn single(text: &str, tag: &str) -> Vec<HistoryEntry> {
        vec![HistoryEntry::new(text, tag)]
    }

    #[test]
    fn explicit_type_wins() {
        let history = single("> climb", "story");
        assert_eq!(ActionClassifier::new(&history).classify(0, None), ActionType::Story);
    }

    #[test]
    fn leading_prompt_is_do() {
        let history = single("> climb the wall", "unknown");
        assert_eq!(ActionClassifier::new(&history).classify(0, None), ActionType::Do);
        let history = single("   > climb", "");
        assert_eq!(ActionClassifier::new(&history).classify(0, None), ActionType::Do);
    }

    #[test]
    fn quoted_speech_is_say() {
        let history = single("He said \"hello there\"", "unknown");
        assert_eq!(ActionClassifier::new(&history).classify(0, None), ActionType::Say);
        let history = single("He said hello there", "unknown");
        assert_eq!(ActionClassifier::new(&history).classify(0, None), ActionType::Unknown);
    }

    #[test]
    fn continue_prompt() {
        let history = single(">>> Please select \"continue\" (0%)", "unknown");
        // the leading '>' rule fires first
        assert_eq!(ActionClassifier::new(&history).classify(0, None), ActionType::Do);
        let history = single("please select   \"continue\"", "unknown");
        assert_eq!(ActionClassifier::new(&history).classify(0, None), ActionType::Continue);
    }

    #[test]
    fn fallback_text_consulted_last() {
        let history = single("climb", "unknown");
        let classifier = ActionClassifier::new(&history);
        assert_eq!(classifier.classify(0, Some("> climb")), ActionType::Do);
        assert_eq!(classifier.classify(0, Some("climb")), ActionType::Unknown);
    }

    #[test]
    fn empty_history_reads_empty() {
        let history: Vec<HistoryEntry> = Vec::new();
        let classifier = ActionClassifier::new(&history);
        assert_eq!(classifier.read_last_action(0), ActionSnapshot::empty());
        assert_eq!(classifier.classify(0, None), ActionType::Unknown);
    }

    #[test]
    fn read_uses_raw_text_and_look_back() {
        let history = vec![
            HistoryEntry {
                text: None,
                raw_text: Some("> open the chest".to_string()),
                action_type: None,
            },
            HistoryEntry::new("The chest creaks.", "continue"),
        ];
        let classifier = ActionClassifier::new(&history);
        let older = classifier.read_last_action(1);
        assert_eq!(older.text, "> open the chest");
        assert_eq!(older.action_type, ActionType::Unknown);
        assert_eq!(classifier.classify(1, None), ActionType::Do);
        assert_eq!(classifier.classify(0, None), ActionType::Continue);
    }
}
