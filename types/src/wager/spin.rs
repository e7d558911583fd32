use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error as ThisError;

use super::MAX_NUMBER;

/// Monotonic identity of a spin within a session.
pub type SpinId = u64;

#[derive(Debug, Clone, Copy, ThisError, PartialEq, Eq)]
pub enum SpinError {
    #[error("spin outcome out of range (got={got}, max={max})")]
    InvalidOutcome { got: u32, max: u8 },
    #[error("spin stake too large (total={total}, max={max})")]
    StakeTooLarge { total: u64, max: u64 },
}

/// A validated pocket number in `0..=36`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u8")]
pub struct SpinOutcome(u8);

impl SpinOutcome {
    pub fn new(number: u32) -> Result<Self, SpinError> {
        if number > u32::from(MAX_NUMBER) {
            return Err(SpinError::InvalidOutcome {
                got: number,
                max: MAX_NUMBER,
            });
        }
        Ok(Self(number as u8))
    }

    pub fn number(self) -> u8 {
        self.0
    }
}

impl TryFrom<u32> for SpinOutcome {
    type Error = SpinError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SpinOutcome> for u8 {
    fn from(value: SpinOutcome) -> Self {
        value.0
    }
}

impl fmt::Display for SpinOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A drawn number as delivered by the surrounding system.
///
/// The outcome is kept raw so that validation happens inside resolution and an
/// out-of-range value is rejected without touching any state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpinEvent {
    pub id: SpinId,
    pub outcome: u32,
    /// Caller-supplied timestamp; the engine never reads a clock.
    #[serde(default)]
    pub at_ms: u64,
}

impl SpinEvent {
    pub fn new(id: SpinId, outcome: u32) -> Self {
        Self {
            id,
            outcome,
            at_ms: 0,
        }
    }

    pub fn at(mut self, at_ms: u64) -> Self {
        self.at_ms = at_ms;
        self
    }
}
