//! Time source for everything that stamps a row.
//!
//! RULE: store methods never call `Utc::now()` themselves.
//! Callers pass `now` in, taken from an injected `Clock`.

use crate::types::Timestamp;
use chrono::{Duration, Utc};
use std::sync::Mutex;

pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// The real clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Utc::now()
    }
}

/// A clock that only moves when told to. Used in tests.
#[derive(Debug)]
pub struct FixedClock {
    current: Mutex<Timestamp>,
}

impl FixedClock {
    pub fn new(start: Timestamp) -> Self {
        Self {
            current: Mutex::new(start),
        }
    }

    /// Move the clock forward. Returns the new instant.
    pub fn advance(&self, by: Duration) -> Timestamp {
        let mut current = self.current.lock().unwrap_or_else(|p| p.into_inner());
        *current += by;
        *current
    }
}

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        *self.current.lock().unwrap_or_else(|p| p.into_inner())
    }
}
