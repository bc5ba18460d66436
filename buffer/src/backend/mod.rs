//! Synchronization strategies guarding a [`Ring`](crate::ring::Ring).

use std::{
    fmt,
    str::FromStr,
    time::{Duration, Instant},
};

use crate::error::{BufferError, Result};

mod monitor;
mod semaphore;

pub use monitor::MonitorBackend;
pub use semaphore::SemaphoreBackend;

/// Largest capacity every backend accepts: the permit count of a POSIX
/// semaphore is bounded by `SEM_VALUE_MAX`, at least `i32::MAX` on Linux.
pub const MAX_CAPACITY: usize = i32::MAX as usize;

pub(crate) fn check_capacity(capacity: usize) -> Result<()> {
    if capacity == 0 {
        return Err(BufferError::invalid_config("buffer capacity must be at least 1"));
    }
    if capacity > MAX_CAPACITY {
        return Err(BufferError::invalid_config(format!(
            "buffer capacity {capacity} exceeds the limit of {MAX_CAPACITY}"
        )));
    }
    Ok(())
}

/// Ring operation seen by an [`OpObserver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Put,
    Take,
}

/// Called while the backend still holds its exclusion mechanism, right after
/// the ring changed, with the new number of occupied slots.
pub trait OpObserver: Send + Sync {
    fn observe(&self, op: Op, len: usize);
}

/// Blocking put/take over a bounded ring.
///
/// `deadline == None` waits indefinitely. A timed-out call has not touched
/// the ring.
pub trait Backend<T>: Send + Sync {
    fn put(&self, value: T, deadline: Option<Deadline>) -> Result<()>;
    fn take(&self, deadline: Option<Deadline>) -> Result<T>;
    fn len(&self) -> usize;
    fn capacity(&self) -> usize;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Strategy {
    /// One mutex with `room_available` / `item_available` condition variables.
    #[default]
    Monitor,
    /// `empty_slots` / `filled_slots` counting semaphores and a binary semaphore.
    Semaphore,
}

impl Strategy {
    pub const ALL: [Strategy; 2] = [Strategy::Monitor, Strategy::Semaphore];
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Monitor => f.write_str("monitor"),
            Self::Semaphore => f.write_str("semaphore"),
        }
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "monitor" | "condvar" => Ok(Self::Monitor),
            "semaphore" | "sem" => Ok(Self::Semaphore),
            _ => Err(format!(
                "Invalid strategy: {s}. Valid options: monitor, semaphore"
            )),
        }
    }
}

/// Point in time a blocking call gives up at, remembering the timeout it
/// was derived from for error reporting.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    at: Instant,
    timeout: Duration,
}

impl Deadline {
    /// `None` when `timeout` reaches past what `Instant` can represent; such
    /// a call waits indefinitely.
    pub fn after(timeout: Duration) -> Option<Self> {
        let at = Instant::now().checked_add(timeout)?;
        Some(Self { at, timeout })
    }

    /// Time left, `None` once the deadline has passed.
    pub fn remaining(&self) -> Option<Duration> {
        let left = self.at.saturating_duration_since(Instant::now());
        (!left.is_zero()).then_some(left)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}
