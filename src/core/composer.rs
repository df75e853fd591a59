/// Renders roll results as the narrator guidance block and the compact
/// result marker shown to the player.

use crate::core::detection::MARKER_TAG;
use crate::schema::roll::RollResult;

const CAUSALITY_RULE: &str = "The declared action may include several parts. If an earlier part fails in a way that makes later parts impossible, do not narrate those later parts as actually happening. You may show the character's intention, frustration, or delayed opportunities, but the impossible actions themselves do not occur in this scene.";

const NARRATION_RULE: [&str; 3] = [
    "Use these outcomes when continuing the story.",
    "Show the consequences naturally in the scene.",
    "Do not mention dice, rolls, or attribute names directly.",
];

/// Renders the bracketed instruction block appended to the context.
pub fn build_guidance_block(results: &[RollResult]) -> String {
    let mut lines: Vec<String> = vec!["[".to_string()];

    for result in results {
        lines.push(format!(
            "The part of the action that depended on {} was a {}.",
            result.attribute,
            result.tier.label().to_uppercase()
        ));
        if !result.guidance_text.is_empty() {
            lines.push(format!("Guidance: {}", result.guidance_text));
        }
        lines.push(String::new());
    }

    if results.iter().any(|r| r.tier.is_failure()) {
        lines.push("Causality rule".to_string());
        lines.push(CAUSALITY_RULE.to_string());
        lines.push(String::new());
    }

    lines.push("Narration rule".to_string());
    lines.extend(NARRATION_RULE.iter().map(|s| s.to_string()));
    lines.push("]".to_string());

    lines.join("\n")
}

/// Renders `[AIDCHAOS Attr (roll/base): Tier, ...]` plus a trailing newline.
pub fn build_result_marker(results: &[RollResult]) -> String {
    let parts: Vec<String> = results
        .iter()
        .map(|r| match (r.is_disabled, r.roll, r.threshold_base) {
            (false, Some(roll), Some(base)) => {
                format!("{} ({}/{}): {}", r.attribute, roll, base, r.tier)
            }
            _ => format!("{} (disabled): {}", r.attribute, r.tier),
        })
        .collect();
    format!("[{} {}]\n", MARKER_TAG, parts.join(", "))
}
