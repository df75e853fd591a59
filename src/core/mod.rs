//! Resolver behavior: catalog, matching, character sheets, rolls,
//! composition, classification and the hook pipeline.

pub mod catalog;
pub mod classifier;
pub mod composer;
pub mod config;
pub mod detection;
pub mod exchange;
pub mod matcher;
pub mod outcome;
pub mod pipeline;
pub mod sheet;
pub mod store;
