/// The d100 roll and its five-tier classification.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;
use thiserror::Error;

use crate::core::catalog::AttributeCatalog;
use crate::schema::attribute::{AttributeValue, OutcomeTier, MAX_SCORE, MIN_SCORE};
use crate::schema::roll::RollResult;

/// Guidance for a disabled attribute that has no critical-failure text.
pub const DISABLED_GUIDANCE: &str =
    "This attribute is disabled for the character. The action automatically fails in the worst possible way.";

const FALLBACK_GUIDANCE: &str = "Defaulted to critical success on error.";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum OutcomeError {
    #[error("attribute score {0} outside {MIN_SCORE}..={MAX_SCORE}")]
    ScoreOutOfRange(u8),
    #[error("dice produced {0}, expected 1..=100")]
    RollOutOfRange(u32),
}

/// A source of uniformly distributed d100 results.
pub trait DiceSource {
    /// Returns an integer in `1..=100`.
    fn d100(&mut self) -> u32;
}

/// Adapts any `rand` generator into a `DiceSource`.
#[derive(Debug, Clone)]
pub struct RngDice<R>(pub R);

impl RngDice<StdRng> {
    pub fn seeded(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Self(StdRng::from_entropy())
    }
}

impl<R: Rng> DiceSource for RngDice<R> {
    fn d100(&mut self) -> u32 {
        self.0.gen_range(1..=100)
    }
}

/// Replays a fixed list of results and counts how many were drawn.
/// Once the script runs out it yields 0, which the resolver rejects.
#[derive(Debug, Clone, Default)]
pub struct ScriptedDice {
    script: VecDeque<u32>,
    calls: usize,
}

impl ScriptedDice {
    pub fn new(rolls: impl IntoIterator<Item = u32>) -> Self {
        Self {
            script: rolls.into_iter().collect(),
            calls: 0,
        }
    }

    /// Number of results drawn so far.
    pub fn calls(&self) -> usize {
        self.calls
    }
}

impl DiceSource for ScriptedDice {
    fn d100(&mut self) -> u32 {
        self.calls += 1;
        self.script.pop_front().unwrap_or(0)
    }
}

/// Tier boundaries for one attribute score. A roll at or below a boundary
/// lands in that tier; everything above `failure` is a critical failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    pub critical: u32,
    pub base: u32,
    pub partial: u32,
    pub failure: u32,
}

impl Thresholds {
    pub fn for_score(score: u8) -> Thresholds {
        let base = 20 + 5 * score as u32;
        let tenth = base / 10;
        Thresholds {
            critical: tenth.max(1),
            base,
            partial: base + 15,
            failure: 90 + tenth,
        }
    }

    pub fn classify(&self, roll: u32) -> OutcomeTier {
        if roll == 1 || roll <= self.critical {
            OutcomeTier::CriticalSuccess
        } else if roll <= self.base {
            OutcomeTier::Success
        } else if roll <= self.partial {
            OutcomeTier::PartialSuccess
        } else if roll <= self.failure {
            OutcomeTier::Failure
        } else {
            OutcomeTier::CriticalFailure
        }
    }
}

/// Rolls attribute checks against the catalog's guidance.
pub struct OutcomeResolver<'a> {
    catalog: &'a AttributeCatalog,
}

impl<'a> OutcomeResolver<'a> {
    pub fn new(catalog: &'a AttributeCatalog) -> Self {
        Self { catalog }
    }

    fn guidance_for(&self, attribute: &str, tier: OutcomeTier) -> String {
        self.catalog
            .guidance(attribute, tier)
            .unwrap_or_else(|| tier.generic_guidance())
            .to_string()
    }

    /// Rolls one check. Disabled attributes fail critically without
    /// touching the dice.
    pub fn try_roll(
        &self,
        attribute: &str,
        value: AttributeValue,
        dice: &mut dyn DiceSource,
    ) -> Result<RollResult, OutcomeError> {
        let score = match value {
            AttributeValue::Disabled => {
                tracing::debug!(attribute, "disabled attribute, automatic critical failure");
                return Ok(RollResult {
                    attribute: attribute.to_string(),
                    is_disabled: true,
                    roll: None,
                    threshold_base: None,
                    tier: OutcomeTier::CriticalFailure,
                    guidance_text: self
                        .catalog
                        .guidance(attribute, OutcomeTier::CriticalFailure)
                        .unwrap_or(DISABLED_GUIDANCE)
                        .to_string(),
                });
            }
            AttributeValue::Score(s) if (MIN_SCORE..=MAX_SCORE).contains(&s) => s,
            AttributeValue::Score(s) => return Err(OutcomeError::ScoreOutOfRange(s)),
        };

        let roll = dice.d100();
        if !(1..=100).contains(&roll) {
            return Err(OutcomeError::RollOutOfRange(roll));
        }

        let thresholds = Thresholds::for_score(score);
        let tier = thresholds.classify(roll);
        tracing::debug!(attribute, score, roll, base = thresholds.base, %tier, "rolled");

        Ok(RollResult {
            attribute: attribute.to_string(),
            is_disabled: false,
            roll: Some(roll),
            threshold_base: Some(thresholds.base),
            tier,
            guidance_text: self.guidance_for(attribute, tier),
        })
    }

    /// Like `try_roll`, but any error yields a critical success so the
    /// story keeps moving.
    pub fn roll(
        &self,
        attribute: &str,
        value: AttributeValue,
        dice: &mut dyn DiceSource,
    ) -> RollResult {
        match self.try_roll(attribute, value, dice) {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(attribute, error = %e, "roll failed, defaulting to critical success");
                Self::fallback(attribute)
            }
        }
    }

    /// The result substituted when a roll fails internally.
    pub fn fallback(attribute: &str) -> RollResult {
        RollResult {
            attribute: attribute.to_string(),
            is_disabled: false,
            roll: Some(1),
            threshold_base: Some(0),
            tier: OutcomeTier::CriticalSuccess,
            guidance_text: FALLBACK_GUIDANCE.to_string(),
        }
    }
}
