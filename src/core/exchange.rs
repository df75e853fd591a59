/// Session state carried between the context and output passes of a turn.

use serde::{Deserialize, Serialize};

use crate::schema::roll::RollResult;
use crate::schema::settings::ConfigurationSnapshot;

/// A single-value slot: written by one pass, consumed once by the next.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeSlot<T> {
    value: Option<T>,
}

impl<T> Default for ExchangeSlot<T> {
    fn default() -> Self {
        Self { value: None }
    }
}

impl<T> ExchangeSlot<T> {
    /// Stores `value`, discarding anything left from an earlier turn.
    pub fn put(&mut self, value: T) {
        self.value = Some(value);
    }

    /// Removes and returns the stored value.
    pub fn take(&mut self) -> Option<T> {
        self.value.take()
    }

    pub fn clear(&mut self) {
        self.value = None;
    }

    pub fn peek(&self) -> Option<&T> {
        self.value.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_none()
    }
}

/// Per-session values the host persists between passes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    /// Configuration loaded by the most recent context pass.
    #[serde(default)]
    pub config: Option<ConfigurationSnapshot>,
    /// Roll results awaiting the output pass.
    #[serde(default)]
    pub rolls: ExchangeSlot<Vec<RollResult>>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }
}
