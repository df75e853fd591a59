use serde::{Deserialize, Serialize};

use super::attribute::OutcomeTier;

/// The outcome of one attribute check for one action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollResult {
    pub attribute: String,
    pub is_disabled: bool,
    /// The d100 draw; `None` when the attribute is disabled.
    pub roll: Option<u32>,
    /// `20 + 5 * score`; `None` when the attribute is disabled.
    pub threshold_base: Option<u32>,
    pub tier: OutcomeTier,
    pub guidance_text: String,
}
