/// Line-oriented reader for `Header:` sections of `- Key: value` lines.
///
/// Records are edited by hand, so parsing is permissive: a leading `>`
/// (host quoting), a missing bullet, mixed-case keys and trailing text after
/// the value are all tolerated by `parse_entry`. Inside a section only
/// bulleted entries with a usable value count; see `scan_section`.

use regex::Regex;
use std::sync::LazyLock;

use super::attribute::RawScore;

static ENTRY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*>?\s*(-)?\s*([A-Za-z][A-Za-z0-9 _'\-]*?)\s*:\s*([+-]?\d+(?:\.\d+)?|[A-Za-z]+)")
        .expect("valid regex")
});

static BLANK_RUN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid regex"));

/// One `Key: value` line inside a section.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionEntry<'a> {
    /// Zero-based line number within the scanned text.
    pub line: usize,
    /// Whether the line carried a leading `-`.
    pub bulleted: bool,
    pub key: &'a str,
    pub value: &'a str,
}

impl SectionEntry<'_> {
    pub fn score(&self) -> Option<RawScore> {
        RawScore::parse(self.value)
    }
}

/// How the scanner classified one line of text.
#[derive(Debug, Clone, PartialEq)]
pub enum SectionLine<'a> {
    /// Not part of any section.
    Outside,
    Header,
    /// Blank line inside an open section; the section stays open.
    Blank,
    Entry(SectionEntry<'a>),
}

/// Classifies every line of `text` against `header` sections.
///
/// A section opens on its header and stays open across blank lines and
/// `- Key: value` entries whose key satisfies `is_known` and whose value is a
/// number or a disabled keyword. Any other line closes it.
pub fn scan_section<'a>(
    text: &'a str,
    header: &str,
    is_known: impl Fn(&str) -> bool,
) -> Vec<(&'a str, SectionLine<'a>)> {
    let mut lines = Vec::new();
    let mut inside = false;

    for (index, line) in text.lines().enumerate() {
        if is_header(line, header) {
            inside = true;
            lines.push((line, SectionLine::Header));
            continue;
        }
        if !inside {
            lines.push((line, SectionLine::Outside));
            continue;
        }
        if line.trim().is_empty() {
            lines.push((line, SectionLine::Blank));
            continue;
        }
        match parse_entry(line, index) {
            Some(entry) if entry.bulleted && is_known(entry.key) && entry.score().is_some() => {
                lines.push((line, SectionLine::Entry(entry)));
            }
            _ => {
                inside = false;
                lines.push((line, SectionLine::Outside));
            }
        }
    }

    lines
}

/// Collects the entries of every `header` section in `text`, in order.
pub fn read_section<'a>(
    text: &'a str,
    header: &str,
    is_known: impl Fn(&str) -> bool,
) -> Vec<SectionEntry<'a>> {
    scan_section(text, header, is_known)
        .into_iter()
        .filter_map(|(_, kind)| match kind {
            SectionLine::Entry(entry) => Some(entry),
            _ => None,
        })
        .collect()
}

/// Removes every `header` section: the header line and each entry that
/// `read_section` would return for the same arguments. Runs of three or more
/// newlines are then collapsed to two and the result is trimmed.
///
/// Returns `None` when the text contains no such header.
pub fn strip_section(text: &str, header: &str, is_known: impl Fn(&str) -> bool) -> Option<String> {
    let scanned = scan_section(text, header, is_known);
    if !scanned.iter().any(|(_, kind)| *kind == SectionLine::Header) {
        return None;
    }

    let kept: Vec<&str> = scanned
        .into_iter()
        .filter(|(_, kind)| matches!(kind, SectionLine::Outside | SectionLine::Blank))
        .map(|(line, _)| line)
        .collect();
    let joined = kept.join("\n");
    Some(BLANK_RUN_RE.replace_all(&joined, "\n\n").trim().to_string())
}
