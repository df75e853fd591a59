/// The hook pipeline: input, context and output passes for one player turn.
///
/// Wires together action classification, configuration loading, attribute
/// detection, outcome rolls and narrative composition.

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::catalog::{AttributeCatalog, CatalogError};
use crate::core::classifier::ActionClassifier;
use crate::core::composer;
use crate::core::config::{ConfigError, ResolverConfig};
use crate::core::detection;
use crate::core::exchange::SessionState;
use crate::core::matcher::TriggerMatcher;
use crate::core::outcome::{DiceSource, OutcomeResolver, RngDice};
use crate::core::sheet::CharacterSheetResolver;
use crate::core::store::{HistoryReader, RecordStore};
use crate::schema::attribute::AttributeValue;
use crate::schema::history::ActionType;
use crate::schema::settings::ConfigurationSnapshot;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("catalog has no attributes")]
    EmptyCatalog,
}

/// The three hook types a host invokes per turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hook {
    Input,
    Context,
    Output,
}

impl Hook {
    pub fn from_tag(tag: &str) -> Option<Hook> {
        match tag.trim().to_lowercase().as_str() {
            "input" => Some(Self::Input),
            "context" => Some(Self::Context),
            "output" => Some(Self::Output),
            _ => None,
        }
    }
}

/// Everything the host lends the pipeline for one pass.
pub struct HostEnv<'a> {
    pub records: &'a mut dyn RecordStore,
    pub history: &'a dyn HistoryReader,
    /// The player's free-text memory/notes.
    pub memory: &'a str,
    pub state: &'a mut SessionState,
}

/// Why a pass returned its text without resolving anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Bypass {
    Automation,
    NotAnAction(ActionType),
    Disabled,
    NoAttributes,
    DisplayDisabled,
    NoResults,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassOutcome {
    pub text: String,
    pub stop: bool,
    pub bypass: Option<Bypass>,
}

impl PassOutcome {
    fn done(text: String, stop: bool) -> Self {
        Self {
            text,
            stop,
            bypass: None,
        }
    }

    fn bypass(text: String, stop: bool, reason: Bypass) -> Self {
        tracing::debug!(?reason, "pass bypassed");
        Self {
            text,
            stop,
            bypass: Some(reason),
        }
    }
}

/// Host-facing result of `dispatch`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookOutput {
    Text(String),
    Context(String, bool),
}

/// The outcome resolver. Built via `Orchestrator::builder()`.
pub struct Orchestrator {
    catalog: AttributeCatalog,
    config: ResolverConfig,
    dice: Box<dyn DiceSource>,
}

/// Builder for constructing an `Orchestrator`.
pub struct OrchestratorBuilder {
    config_path: Option<PathBuf>,
    catalog_paths: Vec<PathBuf>,
    seed: Option<u64>,
    config: Option<ResolverConfig>,
    catalog: Option<AttributeCatalog>,
    dice: Option<Box<dyn DiceSource>>,
}

impl Orchestrator {
    pub fn builder() -> OrchestratorBuilder {
        OrchestratorBuilder {
            config_path: None,
            catalog_paths: Vec::new(),
            seed: None,
            config: None,
            catalog: None,
            dice: None,
        }
    }

    pub fn catalog(&self) -> &AttributeCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn sheet_resolver(&self) -> CharacterSheetResolver<'_> {
        CharacterSheetResolver::new(&self.catalog, &self.config)
    }

    /// Routes a host hook call by tag. Unknown tags return the text as is.
    pub fn dispatch(&mut self, tag: &str, text: &str, stop: bool, env: &mut HostEnv<'_>) -> HookOutput {
        match Hook::from_tag(tag) {
            Some(Hook::Input) => HookOutput::Text(self.on_input(text).text),
            Some(Hook::Context) => {
                let outcome = self.on_context(text, stop, env);
                HookOutput::Context(outcome.text, outcome.stop)
            }
            Some(Hook::Output) => HookOutput::Text(self.on_output(text, env).text),
            None => {
                tracing::debug!(tag, "unknown hook");
                HookOutput::Text(text.to_string())
            }
        }
    }

    /// Removes stale markers from player input.
    pub fn on_input(&self, text: &str) -> PassOutcome {
        let cleaned = detection::strip_markers(text);
        if detection::is_automation_activity(&cleaned) {
            return PassOutcome::bypass(cleaned, false, Bypass::Automation);
        }
        PassOutcome::done(cleaned, false)
    }

    /// Resolves the newest player action and appends narrator guidance.
    pub fn on_context(&mut self, text: &str, stop: bool, env: &mut HostEnv<'_>) -> PassOutcome {
        env.state.rolls.clear();
        let cleaned = detection::strip_markers(text);
        if detection::is_automation_activity(&cleaned) {
            return PassOutcome::bypass(cleaned, stop, Bypass::Automation);
        }

        let classifier = ActionClassifier::new(env.history);
        let action_type = classifier.classify(0, Some(&cleaned));
        if action_type != ActionType::Do {
            return PassOutcome::bypass(cleaned, stop, Bypass::NotAnAction(action_type));
        }

        let snapshot = self.sheet_resolver().load(env.records, env.memory);
        env.state.config = Some(snapshot.clone());
        if !snapshot.enabled {
            return PassOutcome::bypass(cleaned, stop, Bypass::Disabled);
        }

        let action = classifier.read_last_action(0);
        let detected = TriggerMatcher::new(&self.catalog).detect_all_attributes(&action.text);
        if detected.is_empty() {
            return PassOutcome::bypass(cleaned, stop, Bypass::NoAttributes);
        }

        let resolver = OutcomeResolver::new(&self.catalog);
        let default = AttributeValue::clamped(self.config.default_score as f64);
        let results: Vec<_> = detected
            .into_iter()
            .map(|name| {
                let value = snapshot.value(name).unwrap_or(default);
                resolver.roll(name, value, self.dice.as_mut())
            })
            .collect();

        let block = composer::build_guidance_block(&results);
        env.state.rolls.put(results);
        PassOutcome::done(format!("{}\n{}", cleaned, block), stop)
    }

    /// Prepends the result marker when display is on, consuming the rolls
    /// stashed by the context pass.
    pub fn on_output(&self, text: &str, env: &mut HostEnv<'_>) -> PassOutcome {
        let cleaned = detection::strip_markers(text);
        if detection::is_automation_activity(&cleaned) {
            return PassOutcome::bypass(cleaned, false, Bypass::Automation);
        }

        let rolls = env.state.rolls.take();
        let display = self.output_settings(env).result_display;
        if !display {
            return PassOutcome::bypass(cleaned, false, Bypass::DisplayDisabled);
        }
        match rolls {
            Some(results) if !results.is_empty() => {
                let marker = composer::build_result_marker(&results);
                PassOutcome::done(format!("{}{}", marker, cleaned), false)
            }
            _ => PassOutcome::bypass(cleaned, false, Bypass::NoResults),
        }
    }

    fn output_settings(&self, env: &mut HostEnv<'_>) -> ConfigurationSnapshot {
        match &env.state.config {
            Some(snapshot) => snapshot.clone(),
            None => self.sheet_resolver().load(env.records, env.memory),
        }
    }

    /// Host entry point for the input hook.
    pub fn input(&self, text: &str) -> String {
        self.on_input(text).text
    }

    /// Host entry point for the context hook.
    pub fn context(&mut self, text: &str, stop: bool, env: &mut HostEnv<'_>) -> (String, bool) {
        let outcome = self.on_context(text, stop, env);
        (outcome.text, outcome.stop)
    }

    /// Host entry point for the output hook.
    pub fn output(&self, text: &str, env: &mut HostEnv<'_>) -> String {
        self.on_output(text, env).text
    }
}

impl OrchestratorBuilder {
    /// Load resolver settings from a RON file; overrides `config`.
    pub fn config_path(mut self, path: impl AsRef<Path>) -> Self {
        self.config_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Merge attribute definitions from a RON file over the base catalog.
    pub fn catalog_path(mut self, path: impl AsRef<Path>) -> Self {
        self.catalog_paths.push(path.as_ref().to_path_buf());
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Provide settings directly (for testing without files).
    pub fn config(mut self, config: ResolverConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Replace the built-in catalog.
    pub fn catalog(mut self, catalog: AttributeCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Provide a dice source directly; takes precedence over `seed`.
    pub fn with_dice(mut self, dice: impl DiceSource + 'static) -> Self {
        self.dice = Some(Box::new(dice));
        self
    }

    pub fn build(self) -> Result<Orchestrator, PipelineError> {
        let mut catalog = self.catalog.unwrap_or_default();
        for path in &self.catalog_paths {
            catalog.merge(AttributeCatalog::load_from_ron(path)?);
        }
        if catalog.is_empty() {
            return Err(PipelineError::EmptyCatalog);
        }

        let config = match self.config_path {
            Some(ref path) => ResolverConfig::load_from_ron(path)?,
            None => self.config.unwrap_or_default(),
        };
        config.validate()?;

        let dice: Box<dyn DiceSource> = match (self.dice, self.seed) {
            (Some(dice), _) => dice,
            (None, Some(seed)) => Box::new(RngDice::seeded(seed)),
            (None, None) => Box::new(RngDice::from_entropy()),
        };

        tracing::debug!(attributes = catalog.len(), "orchestrator built");
        Ok(Orchestrator {
            catalog,
            config,
            dice,
        })
    }
}
