//! AidChaos — rule-based outcome resolution for interactive fiction.
//!
//! Detects which character attributes a player action calls for, rolls a
//! weighted d100 outcome for each, and hands the narrator a guidance block
//! plus an optional result marker, without any model inference.

pub mod core;
pub mod schema;

pub use crate::core::pipeline::{HookOutput, HostEnv, Orchestrator, PipelineError};
