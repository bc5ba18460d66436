//! Error types for the bounded buffer and the run coordinator.

use std::{fmt, time::Duration};

use thiserror::Error;

pub type Result<T> = std::result::Result<T, BufferError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BufferError {
    /// A run or buffer was configured with values it cannot operate on.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// The slot protocol was broken. Only a synchronization bug gets here.
    #[error("Buffer corruption at slot {index}: {invariant}")]
    Corruption { invariant: Invariant, index: usize },

    #[error("Timed out after {0:?}")]
    Timeout(Duration),
}

impl BufferError {
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    pub fn is_corruption(&self) -> bool {
        matches!(self, Self::Corruption { .. })
    }
}

/// Slot invariants checked on every ring mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Invariant {
    /// `put` found the slot at `head` already occupied.
    PutIntoOccupied,
    /// `take` found the slot at `tail` empty.
    TakeFromEmpty,
}

impl fmt::Display for Invariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PutIntoOccupied => f.write_str("tried to fill a non-empty slot"),
            Self::TakeFromEmpty => f.write_str("tried to take from an empty slot"),
        }
    }
}
