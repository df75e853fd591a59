use regex::Regex;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use super::attribute::{AttributeValue, RawScore};
use super::sections::{self, SectionEntry};

/// Header of the attribute section in settings and base records.
pub const ATTRIBUTES_HEADER: &str = "Attributes";
/// Header of the modifier section in modifier records.
pub const MODIFIERS_HEADER: &str = "Attribute-Modifiers";

static FLAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\s*>?\s*(aidchaos\s+enabled|result\s+output\s+enabled|inheritance\s+processed)\s*:\s*(true|false)\b",
    )
    .expect("valid regex")
});

/// The resolver's settings for one pass: switches plus one value per attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigurationSnapshot {
    pub enabled: bool,
    pub result_display: bool,
    pub inheritance_resolved: bool,
    pub attributes: FxHashMap<String, AttributeValue>,
}

impl ConfigurationSnapshot {
    /// Enabled, display off, inheritance pending, every attribute at `score`.
    pub fn defaults<'a>(names: impl IntoIterator<Item = &'a str>, score: u8) -> Self {
        let value = AttributeValue::clamped(score as f64);
        Self {
            enabled: true,
            result_display: false,
            inheritance_resolved: false,
            attributes: names.into_iter().map(|n| (n.to_string(), value)).collect(),
        }
    }

    /// Looks up an attribute by name, ignoring case.
    pub fn value(&self, name: &str) -> Option<AttributeValue> {
        self.attributes.get(name).copied().or_else(|| {
            self.attributes
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| *v)
        })
    }

    /// Builds a snapshot from parsed settings text. Flags missing from the
    /// text keep their defaults; attributes are canonicalized to `names`,
    /// unknown keys are dropped and missing ones get `default_score`.
    pub fn from_settings(parsed: &SettingsText, names: &[&str], default_score: u8) -> Self {
        let mut snapshot = Self::defaults(names.iter().copied(), default_score);
        if let Some(enabled) = parsed.enabled {
            snapshot.enabled = enabled;
        }
        if let Some(display) = parsed.result_display {
            snapshot.result_display = display;
        }
        if let Some(resolved) = parsed.inheritance_resolved {
            snapshot.inheritance_resolved = resolved;
        }
        for (key, raw) in &parsed.attributes {
            if let Some(canonical) = names.iter().find(|n| n.eq_ignore_ascii_case(key)) {
                snapshot
                    .attributes
                    .insert(canonical.to_string(), raw.finalize());
            }
        }
        snapshot
    }

    /// Renders the canonical settings-record text, attributes in `names`
    /// order. Attributes missing from the snapshot are skipped.
    pub fn render(&self, names: &[&str]) -> String {
        let mut lines = vec![
            format!("AidChaos enabled: {}", self.enabled),
            format!("Result Output enabled: {}", self.result_display),
            format!("Inheritance processed: {}", self.inheritance_resolved),
            String::new(),
            format!("{}:", ATTRIBUTES_HEADER),
        ];
        for name in names {
            if let Some(value) = self.attributes.get(*name) {
                lines.push(format!("- {}: {}", name, value));
            }
        }
        lines.join("\n")
    }
}

/// What a settings record actually says; anything absent stays `None`/empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettingsText {
    pub enabled: Option<bool>,
    pub result_display: Option<bool>,
    pub inheritance_resolved: Option<bool>,
    /// Raw `(key, value)` pairs from the Attributes section, in file order.
    pub attributes: Vec<(String, RawScore)>,
}

impl SettingsText {
    pub fn parse(raw: &str) -> SettingsText {
        let mut parsed = SettingsText::default();

        for line in raw.lines() {
            let Some(caps) = FLAG_RE.captures(line) else {
                continue;
            };
            let key = caps[1]
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ")
                .to_lowercase();
            let value = caps[2].eq_ignore_ascii_case("true");
            match key.as_str() {
                "aidchaos enabled" => parsed.enabled = Some(value),
                "result output enabled" => parsed.result_display = Some(value),
                "inheritance processed" => parsed.inheritance_resolved = Some(value),
                _ => {}
            }
        }

        parsed.attributes = attribute_entries(raw, ATTRIBUTES_HEADER, |_| true);
        parsed
    }

    /// True when the Attributes section holds at least one usable value.
    pub fn has_attribute_data(&self) -> bool {
        !self.attributes.is_empty()
    }
}

/// Reads the `header` section of a record body as `(key, score)` pairs.
pub fn attribute_entries(
    body: &str,
    header: &str,
    is_known: impl Fn(&str) -> bool,
) -> Vec<(String, RawScore)> {
    sections::read_section(body, header, is_known)
        .iter()
        .filter_map(|e: &SectionEntry<'_>| e.score().map(|s| (e.key.to_string(), s)))
        .collect()
}
