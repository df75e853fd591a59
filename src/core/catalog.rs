/// Attribute catalog — the registry of attribute definitions, their
/// normalized triggers and per-tier guidance.

use rustc_hash::FxHashSet;
use std::path::Path;
use std::sync::OnceLock;
use thiserror::Error;

use crate::schema::attribute::{AttributeDefinition, OutcomeTier};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("duplicate attribute: {0}")]
    DuplicateAttribute(String),
    #[error("attribute name must not be empty")]
    EmptyName,
}

/// Triggers of one attribute, split by shape. Everything is lowercase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TriggerSet {
    /// Single tokens, matched against the tokenized text.
    pub singles: FxHashSet<String>,
    /// Multi-word phrases, matched by substring against the lowercased text.
    pub phrases: Vec<String>,
}

impl TriggerSet {
    fn from_raw(raw: &[String]) -> TriggerSet {
        let mut set = TriggerSet::default();
        for trigger in raw {
            let trigger = trigger.trim().to_lowercase();
            if trigger.is_empty() {
                continue;
            }
            if trigger.contains(char::is_whitespace) {
                if !set.phrases.contains(&trigger) {
                    set.phrases.push(trigger);
                }
            } else {
                set.singles.insert(trigger);
            }
        }
        set
    }
}

/// Ordered, immutable registry of attribute definitions.
#[derive(Debug, Clone)]
pub struct AttributeCatalog {
    definitions: Vec<AttributeDefinition>,
    /// Parallel to `definitions`; filled on first trigger lookup.
    normalized: OnceLock<Vec<TriggerSet>>,
}

impl AttributeCatalog {
    /// Builds a catalog, rejecting empty or duplicate (case-insensitive) names.
    pub fn new(definitions: Vec<AttributeDefinition>) -> Result<Self, CatalogError> {
        let mut seen = FxHashSet::default();
        for def in &definitions {
            let key = def.name.trim().to_lowercase();
            if key.is_empty() {
                return Err(CatalogError::EmptyName);
            }
            if !seen.insert(key) {
                return Err(CatalogError::DuplicateAttribute(def.name.clone()));
            }
        }
        Ok(Self {
            definitions,
            normalized: OnceLock::new(),
        })
    }

    /// Load a catalog from a RON file holding a list of definitions.
    pub fn load_from_ron(path: &Path) -> Result<Self, CatalogError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    /// Parse a catalog from a RON string.
    pub fn parse_ron(input: &str) -> Result<Self, CatalogError> {
        let definitions: Vec<AttributeDefinition> = ron::from_str(input)?;
        Self::new(definitions)
    }

    /// Merge another catalog into this one. Definitions from `other`
    /// replace same-named ones in place; new names are appended.
    pub fn merge(&mut self, other: AttributeCatalog) {
        for def in other.definitions {
            match self
                .definitions
                .iter_mut()
                .find(|d| d.name.eq_ignore_ascii_case(&def.name))
            {
                Some(existing) => *existing = def,
                None => self.definitions.push(def),
            }
        }
        self.normalized = OnceLock::new();
    }

    /// A catalog with no attributes, for building up by `merge`.
    pub fn empty() -> Self {
        Self {
            definitions: Vec::new(),
            normalized: OnceLock::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    pub fn definitions(&self) -> &[AttributeDefinition] {
        &self.definitions
    }

    /// Attribute names in catalog order.
    pub fn names(&self) -> Vec<&str> {
        self.definitions.iter().map(|d| d.name.as_str()).collect()
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        let name = name.trim();
        self.definitions
            .iter()
            .position(|d| d.name.eq_ignore_ascii_case(name))
    }

    pub fn get(&self, name: &str) -> Option<&AttributeDefinition> {
        self.index_of(name).map(|i| &self.definitions[i])
    }

    /// The catalog spelling of `name`, matched case-insensitively.
    pub fn canonical_name(&self, name: &str) -> Option<&str> {
        self.get(name).map(|d| d.name.as_str())
    }

    /// Guidance registered for `name` at `tier`; empty strings count as absent.
    pub fn guidance(&self, name: &str, tier: OutcomeTier) -> Option<&str> {
        self.get(name)?
            .guidance
            .get(&tier)
            .map(|s| s.as_str())
            .filter(|s| !s.trim().is_empty())
    }

    fn normalized(&self) -> &[TriggerSet] {
        self.normalized.get_or_init(|| {
            self.definitions
                .iter()
                .map(|d| TriggerSet::from_raw(&d.triggers))
                .collect()
        })
    }

    pub fn triggers(&self, name: &str) -> Option<&TriggerSet> {
        self.index_of(name).map(|i| &self.normalized()[i])
    }

    /// `(name, triggers)` pairs in catalog order.
    pub fn trigger_sets(&self) -> impl Iterator<Item = (&str, &TriggerSet)> {
        self.definitions
            .iter()
            .map(|d| d.name.as_str())
            .zip(self.normalized().iter())
    }
}

impl Default for AttributeCatalog {
    fn default() -> Self {
        Self {
            definitions: builtin_definitions(),
            normalized: OnceLock::new(),
        }
    }
}

fn builtin_definitions() -> Vec<AttributeDefinition> {
    vec![
        AttributeDefinition::new(
            "Strength",
            &[
                "lift", "push", "pull", "break", "carry", "shove", "throw", "crush", "pry",
                "wrestle", "smash", "bash", "strike", "hit", "punch", "kick", "slam", "haul",
                "drag", "tackle", "rip", "tear", "bend", "heave", "ram", "force", "grapple",
                "press", "burst", "knock", "overpower", "pound", "shatter", "thrust", "brace",
                "strain", "snap", "break down", "kick down", "force open",
            ],
            [
                "The character greatly exceeds normal physical limits and gains an impressive advantage.",
                "The character succeeds at the physical task in a solid and believable way.",
                "The character makes progress, but the physical outcome is incomplete or costly.",
                "The physical attempt does not succeed and the obstacle remains in place.",
                "The character badly misjudges their physical power and suffers a setback or harm.",
            ],
        ),
        AttributeDefinition::new(
            "Dexterity",
            &[
                "dodge", "climb", "balance", "catch", "sneak", "pickpocket", "acrobat", "jump",
                "steal", "parry", "roll", "flip", "vault", "evade", "weave", "sidestep", "crawl",
                "slide", "duck", "twist", "maneuver", "aim", "draw", "fire", "reload", "dance",
                "juggle", "lockpick", "tie", "untie", "disarm", "feint", "backflip", "tiptoe",
                "land", "react", "grab", "snatch", "silent", "pick lock", "pick the lock",
                "sleight of hand",
            ],
            [
                "The character executes the precise movement with extraordinary grace and speed, achieving an optimal result.",
                "The character performs the agile or precise action competently and effectively.",
                "The character manages the delicate task, but the execution is flawed or draws unwanted attention.",
                "The character cannot execute the fine motor or agile maneuver as intended.",
                "The character loses control, stumbles badly, or creates a loud commotion that worsens the situation.",
            ],
        ),
        AttributeDefinition::new(
            "Intelligence",
            &[
                "analyze", "solve", "calculate", "deduce", "research", "study", "investigate",
                "learn", "plan", "think", "remember", "reason", "strategize", "inspect", "examine",
                "read", "interpret", "translate", "decipher", "invent", "design", "engineer",
                "craft", "create", "synthesize", "formulate", "compare", "predict", "diagnose",
                "recall", "evaluate", "categorize", "compile", "crosscheck", "hypothesize",
                "experiment", "teach", "educate", "program", "estimate", "map", "figure out",
                "work out", "piece together",
            ],
            [
                "The character gains a brilliant insight or solves the problem in a remarkably efficient and creative way.",
                "The character figures out the puzzle, recalls the information, or completes the intellectual task successfully.",
                "The character grasps part of the solution or finds a clue, but key details remain unclear or require more effort.",
                "The character cannot solve the problem, recall the fact, or understand the mechanism at this time.",
                "The character draws a dangerously wrong conclusion or forgets crucial information, leading to a significant mistake.",
            ],
        ),
        AttributeDefinition::new(
            "Charisma",
            &[
                "persuade", "convince", "seduce", "negotiate", "charm", "intimidate", "flatter",
                "lie", "beguile", "encourage", "inspire", "motivate", "cheer", "taunt", "mock",
                "deceive", "perform", "entertain", "comfort", "lead", "command", "manipulate",
                "coerce", "rally", "boast", "compliment", "impress", "debate", "argue", "question",
                "beg", "plead", "befriend", "threaten", "scold", "praise", "propose", "flirt",
                "sing", "act", "bluff", "story", "talk into", "talk down", "win over",
            ],
            [
                "The character wins over the other party completely, forming a strong positive impression or gaining exceptional cooperation.",
                "The character succeeds in the social interaction; the target is inclined to react positively and be more open toward them.",
                "The character makes some headway socially, but the target remains guarded or asks for something in return.",
                "The social attempt falls flat; the target is unmoved, skeptical, or uninterested.",
                "The character offends, alienates, or provokes the target, making the situation significantly worse.",
            ],
        ),
        AttributeDefinition::new(
            "Perception",
            &[
                "see", "spot", "hear", "listen", "discover", "detect", "observe", "scan", "search",
                "notice", "smell", "sense", "feel", "peek", "survey", "inspect", "track", "follow",
                "glimpse", "watch", "recognize", "identify", "perceive", "overhear", "taste",
                "sniff", "discern", "clue", "look around", "keep watch", "listen for",
            ],
            [
                "The character notices hidden or subtle details that reveal important secrets or give a decisive advantage.",
                "The character perceives the relevant details, clues, or dangers in the environment clearly.",
                "The character picks up on something, but the information is incomplete or ambiguous.",
                "The character fails to notice the important detail, clue, or threat.",
                "The character misinterprets what they sense, leading to a false assumption or walking into danger.",
            ],
        ),
    ]
}
