/// Trigger matching — tokenization and attribute detection in action text.

use regex::Regex;
use rustc_hash::FxHashSet;

use crate::core::catalog::AttributeCatalog;

/// Characters replaced by spaces before splitting.
fn is_bracket_or_quote(c: char) -> bool {
    matches!(
        c,
        '"' | '\u{201C}' | '\u{201D}' | '\u{2018}' | '\u{2019}' | '<' | '>' | '[' | ']' | '{' | '}'
            | '(' | ')'
    )
}

fn is_token_char(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit() || c == '\''
}

/// Lowercases `text` and splits it into tokens of `[a-z0-9']`.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .chars()
        .map(|c| if is_bracket_or_quote(c) { ' ' } else { c })
        .collect::<String>()
        .split(|c: char| !is_token_char(c))
        .filter(|t| !t.is_empty())
        .map(|t| t.to_string())
        .collect()
}

/// Detects which catalog attributes an action text calls for.
pub struct TriggerMatcher<'a> {
    catalog: &'a AttributeCatalog,
    /// Whole-word, case-insensitive name patterns, parallel to catalog order.
    mention_patterns: Vec<Option<Regex>>,
}

impl<'a> TriggerMatcher<'a> {
    pub fn new(catalog: &'a AttributeCatalog) -> Self {
        let mention_patterns = catalog
            .names()
            .iter()
            .map(|name| {
                let pattern = format!(r"(?i)\b{}\b", regex::escape(name.trim()));
                match Regex::new(&pattern) {
                    Ok(re) => Some(re),
                    Err(e) => {
                        tracing::warn!(attribute = %name, error = %e, "unusable attribute name pattern");
                        None
                    }
                }
            })
            .collect();
        Self {
            catalog,
            mention_patterns,
        }
    }

    /// Attributes named outright in the text ("using my strength").
    pub fn detect_explicit_mentions(&self, text: &str) -> FxHashSet<&'a str> {
        self.catalog
            .names()
            .into_iter()
            .zip(&self.mention_patterns)
            .filter(|(_, re)| matches!(re, Some(re) if re.is_match(text)))
            .map(|(name, _)| name)
            .collect()
    }

    /// Attributes whose triggers appear in the text. Phrase triggers are
    /// checked first by substring against `raw_text`, then single triggers
    /// by token membership. Each attribute stops at its first hit.
    pub fn detect_trigger_matches(&self, tokens: &[String], raw_text: &str) -> FxHashSet<&'a str> {
        let lower = raw_text.to_lowercase();
        let token_set: FxHashSet<&str> = tokens.iter().map(|t| t.as_str()).collect();
        let mut matched = FxHashSet::default();

        for (name, triggers) in self.catalog.trigger_sets() {
            if let Some(phrase) = triggers.phrases.iter().find(|p| lower.contains(p.as_str())) {
                tracing::debug!(attribute = name, phrase = %phrase, "phrase trigger");
                matched.insert(name);
            }
        }

        for (name, triggers) in self.catalog.trigger_sets() {
            if matched.contains(name) {
                continue;
            }
            if let Some(token) = triggers.singles.iter().find(|t| token_set.contains(t.as_str())) {
                tracing::debug!(attribute = name, token = %token, "token trigger");
                matched.insert(name);
            }
        }

        matched
    }

    /// Union of explicit mentions and trigger matches, in catalog order.
    pub fn detect_all_attributes(&self, text: &str) -> Vec<&'a str> {
        let explicit = self.detect_explicit_mentions(text);
        let tokens = tokenize(text);
        let triggered = self.detect_trigger_matches(&tokens, text);

        let detected: Vec<&'a str> = self
            .catalog
            .names()
            .into_iter()
            .filter(|name| explicit.contains(name) || triggered.contains(name))
            .collect();
        tracing::debug!(?detected, "detected attributes");
        detected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::attribute::AttributeDefinition;

    #[test]
    fn tokenize_lowercases_and_splits() {
        assert_eq!(
            tokenize("I PUSH the door, hard!"),
            vec!["i", "push", "the", "door", "hard"]
        );
    }

    #[test]
    fn tokenize_keeps_apostrophes_and_drops_brackets() {
        assert_eq!(
            tokenize("\u{201C}Don't\u{201D} [look] (at) {me}"),
            vec!["don't", "look", "at", "me"]
        );
        assert_eq!(tokenize("> climb"), vec!["climb"]);
    }

    #[test]
    fn tokenize_empty_and_symbol_only() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("!!! ... ---").is_empty());
    }

    #[test]
    fn tokenize_non_ascii_letters_split() {
        assert_eq!(tokenize("café au lait"), vec!["caf", "au", "lait"]);
    }

    #[test]
    fn explicit_mentions_are_whole_word() {
        let catalog = AttributeCatalog::default();
        let matcher = TriggerMatcher::new(&catalog);
        let found = matcher.detect_explicit_mentions("Using all my STRENGTH and perception");
        assert!(found.contains("Strength"));
        assert!(found.contains("Perception"));
        assert_eq!(found.len(), 2);
        assert!(matcher.detect_explicit_mentions("strengths aside").is_empty());
    }

    #[test]
    fn phrase_trigger_matches_multi_word() {
        let catalog = AttributeCatalog::default();
        let matcher = TriggerMatcher::new(&catalog);
        let text = "I kneel and pick the lock quietly";
        let found = matcher.detect_trigger_matches(&tokenize(text), text);
        assert!(found.contains("Dexterity"));
    }

    #[test]
    fn single_trigger_matches_token_not_substring() {
        let catalog = AttributeCatalog::default();
        let matcher = TriggerMatcher::new(&catalog);
        let text = "I pushed";
        assert!(matcher.detect_trigger_matches(&tokenize(text), text).is_empty());
        let text = "I push";
        assert!(matcher.detect_trigger_matches(&tokenize(text), text).contains("Strength"));
    }

    #[test]
    fn push_the_door_detects_strength() {
        let catalog = AttributeCatalog::default();
        let matcher = TriggerMatcher::new(&catalog);
        assert_eq!(matcher.detect_all_attributes("I try to push the door"), vec!["Strength"]);
    }

    #[test]
    fn explicit_and_trigger_union_deduplicates() {
        let catalog = AttributeCatalog::default();
        let matcher = TriggerMatcher::new(&catalog);
        let found = matcher.detect_all_attributes("I use my Intelligence to read the sign");
        assert_eq!(found, vec!["Intelligence"]);
    }

    #[test]
    fn multiple_attributes_in_one_action() {
        let catalog = AttributeCatalog::default();
        let matcher = TriggerMatcher::new(&catalog);
        let found = matcher.detect_all_attributes("I sneak past and try to persuade the guard");
        assert_eq!(found, vec!["Dexterity", "Charisma"]);
    }

    #[test]
    fn nothing_detected_in_plain_text() {
        let catalog = AttributeCatalog::default();
        let matcher = TriggerMatcher::new(&catalog);
        assert!(matcher.detect_all_attributes("The sun is warm today.").is_empty());
        assert!(matcher.detect_all_attributes("").is_empty());
    }

    #[test]
    fn names_with_regex_metacharacters_are_escaped() {
        let def = AttributeDefinition::new("Sixth.Sense", &[], ["a", "b", "c", "d", "e"]);
        let catalog = AttributeCatalog::new(vec![def]).unwrap();
        let matcher = TriggerMatcher::new(&catalog);
        assert!(matcher.detect_explicit_mentions("my sixth.sense tingles").contains("Sixth.Sense"));
        assert!(matcher.detect_explicit_mentions("my sixthXsense tingles").is_empty());
    }
}
