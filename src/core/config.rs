/// Record titles, type tags and defaults used by the resolver.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::schema::attribute::{MAX_SCORE, MIN_SCORE};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("default score {0} outside {MIN_SCORE}..={MAX_SCORE}")]
    DefaultScore(u8),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Title of the settings record.
    pub settings_title: String,
    /// Type tag given to the settings record when it is created.
    pub settings_type: String,
    /// Record type whose `Attributes:` section supplies base values.
    pub base_type: String,
    /// Record types whose `Attribute-Modifiers:` sections adjust them, in order.
    pub modifier_types: Vec<String>,
    pub default_score: u8,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            settings_title: "AidChaos Configuration".to_string(),
            settings_type: "settings".to_string(),
            base_type: "Class".to_string(),
            modifier_types: vec!["Race".to_string()],
            default_score: 5,
        }
    }
}

impl ResolverConfig {
    pub fn load_from_ron(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    pub fn parse_ron(input: &str) -> Result<Self, ConfigError> {
        let config: ResolverConfig = ron::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_SCORE..=MAX_SCORE).contains(&self.default_score) {
            return Err(ConfigError::DefaultScore(self.default_score));
        }
        Ok(())
    }
}
