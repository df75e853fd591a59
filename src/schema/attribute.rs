use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lowest playable attribute score.
pub const MIN_SCORE: u8 = 1;
/// Highest playable attribute score.
pub const MAX_SCORE: u8 = 10;

/// Keywords that mark an attribute as narratively unavailable.
pub const DISABLED_KEYWORDS: &[&str] = &[
    "unavailable",
    "disabled",
    "impossible",
    "forbidden",
    "inaccessible",
];

/// The five ordered outcome classifications, best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OutcomeTier {
    CriticalSuccess,
    Success,
    PartialSuccess,
    Failure,
    CriticalFailure,
}

impl OutcomeTier {
    pub const ALL: [OutcomeTier; 5] = [
        Self::CriticalSuccess,
        Self::Success,
        Self::PartialSuccess,
        Self::Failure,
        Self::CriticalFailure,
    ];

    /// Human-readable name used in markers and guidance blocks.
    pub fn label(&self) -> &'static str {
        match self {
            Self::CriticalSuccess => "Critical Success",
            Self::Success => "Success",
            Self::PartialSuccess => "Partial Success",
            Self::Failure => "Failure",
            Self::CriticalFailure => "Critical Failure",
        }
    }

    /// Returns true for `Failure` and `CriticalFailure`.
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure | Self::CriticalFailure)
    }

    /// Guidance used when an attribute has no text registered for this tier.
    pub fn generic_guidance(&self) -> &'static str {
        match self {
            Self::CriticalSuccess => "Outstanding success. The action succeeds spectacularly.",
            Self::Success => "Normal success. The action succeeds.",
            Self::PartialSuccess => "Partial success. The action succeeds with a drawback.",
            Self::Failure => "Failure. The action fails.",
            Self::CriticalFailure => "Critical failure. Catastrophic result.",
        }
    }
}

impl fmt::Display for OutcomeTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A finished attribute value: a clamped score or the disabled sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttributeValue {
    Score(u8),
    Disabled,
}

impl AttributeValue {
    /// Floors and clamps a raw number into `MIN_SCORE..=MAX_SCORE`.
    /// Non-finite input clamps to the nearest bound (NaN to the minimum).
    pub fn clamped(raw: f64) -> AttributeValue {
        let floored = raw.floor();
        let score = if floored.is_nan() || floored < MIN_SCORE as f64 {
            MIN_SCORE
        } else if floored > MAX_SCORE as f64 {
            MAX_SCORE
        } else {
            floored as u8
        };
        AttributeValue::Score(score)
    }

    pub fn score(&self) -> Option<u8> {
        match self {
            Self::Score(s) => Some(*s),
            Self::Disabled => None,
        }
    }

    pub fn is_disabled(&self) -> bool {
        matches!(self, Self::Disabled)
    }

    /// Re-applies the score bounds; a no-op for values built via `clamped`.
    pub fn reclamped(self) -> AttributeValue {
        match self {
            Self::Score(s) => Self::clamped(s as f64),
            Self::Disabled => Self::Disabled,
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Score(s) => write!(f, "{}", s),
            Self::Disabled => f.write_str("disabled"),
        }
    }
}

/// A value read from a character-sheet line, before composition and clamping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawScore {
    Number(f64),
    Disabled,
}

impl RawScore {
    /// Parses a disabled keyword (any case) or a finite signed number.
    pub fn parse(token: &str) -> Option<RawScore> {
        let token = token.trim();
        if DISABLED_KEYWORDS
            .iter()
            .any(|k| k.eq_ignore_ascii_case(token))
        {
            return Some(RawScore::Disabled);
        }
        match token.parse::<f64>() {
            Ok(n) if n.is_finite() => Some(RawScore::Number(n)),
            _ => None,
        }
    }

    /// Adds a modifier to this value. Disabled on either side wins.
    pub fn compose(self, modifier: RawScore) -> RawScore {
        match (self, modifier) {
            (RawScore::Number(base), RawScore::Number(delta)) => RawScore::Number(base + delta),
            _ => RawScore::Disabled,
        }
    }

    /// Clamps into a finished value.
    pub fn finalize(self) -> AttributeValue {
        match self {
            RawScore::Number(n) => AttributeValue::clamped(n),
            RawScore::Disabled => AttributeValue::Disabled,
        }
    }
}

impl From<AttributeValue> for RawScore {
    fn from(value: AttributeValue) -> Self {
        match value {
            AttributeValue::Score(s) => RawScore::Number(s as f64),
            AttributeValue::Disabled => RawScore::Disabled,
        }
    }
}

/// A named character capability with its triggers and per-tier guidance.
///
/// Triggers are stored as written; the catalog splits them into single
/// tokens and multi-word phrases.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributeDefinition {
    pub name: String,
    #[serde(default)]
    pub triggers: Vec<String>,
    #[serde(default)]
    pub guidance: FxHashMap<OutcomeTier, String>,
}

impl AttributeDefinition {
    pub fn new(name: &str, triggers: &[&str], guidance: [&str; 5]) -> Self {
        Self {
            name: name.to_string(),
            triggers: triggers.iter().map(|t| t.to_string()).collect(),
            guidance: OutcomeTier::ALL
                .iter()
                .zip(guidance)
                .map(|(tier, text)| (*tier, text.to_string()))
                .collect(),
        }
    }
}
