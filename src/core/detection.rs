/// Recognizes text produced by other automation sharing the channel, and
/// strips the resolver's own result markers.

use regex::Regex;
use std::sync::LazyLock;

/// Tag that opens every result marker line.
pub const MARKER_TAG: &str = "AIDCHAOS";

static AUTOMATION_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        // slash commands
        r"(?i)/\s*A\s*C",
        r"(?i)CONFIRM\s*DELETE",
        r#"(?i)>>>\s*please\s*select\s*"continue""#,
        // card title headers
        r"(?i)\{title:\s*[\s\S]*?\}",
        // system messages
        r">>>\s*[\s\S]*?<<<",
        r"(?i)summariz(ing|ed)\s+.*\s+memories",
        r"(?i)Auto(?:-|\s*)Cards\s+(?:has\s+been|will)",
        // leading command characters
        r"^[\s\n]*[/{]",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid regex"))
    .collect()
});

static MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?m)^\[{}\s+[^\]]*\]\s*", MARKER_TAG)).expect("valid regex")
});

/// True when `text` looks like another tool's command, prompt or card.
pub fn is_automation_activity(text: &str) -> bool {
    match AUTOMATION_PATTERNS.iter().find(|re| re.is_match(text)) {
        Some(re) => {
            tracing::debug!(pattern = re.as_str(), "automation activity detected");
            true
        }
        None => false,
    }
}

/// Removes every marker line, repeating until nothing changes, so
/// `strip_markers(strip_markers(x)) == strip_markers(x)`.
pub fn strip_markers(text: &str) -> String {
    let mut current = text.to_string();
    loop {
        let next = MARKER_RE.replace_all(&current, "");
        if next == current {
            return current;
        }
        current = next.into_owned();
    }
}
