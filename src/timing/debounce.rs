//! Stabilizing filter for externally observed values.
//!
//! A new value is adopted only after it has been seen continuously for
//! [`DWELL_MS`].  Assumes `update()` is called on every main-loop pass.

use super::{elapsed, SECOND};

/// Minimum time a candidate must hold before it becomes stable.
pub const DWELL_MS: u32 = SECOND;

#[derive(Debug, Clone, Copy)]
pub struct Debouncer<T> {
    stable: T,
    candidate: T,
    candidate_since_ms: u32,
}

impl<T: Copy + PartialEq> Debouncer<T> {
    pub const fn new(initial: T) -> Self {
        Self {
            stable: initial,
            candidate: initial,
            candidate_since_ms: 0,
        }
    }

    /// Feed one observation and return the stable value.
    pub fn update(&mut self, value: T, now_ms: u32) -> T {
        if value == self.stable {
            // nothing pending
        } else if value != self.candidate {
            // first sighting of a new candidate
            self.candidate_since_ms = now_ms;
        } else if elapsed(now_ms, self.candidate_since_ms) >= DWELL_MS {
            self.stable = value;
        }
        self.candidate = value;
        self.stable
    }

    pub fn stable(&self) -> T {
        self.stable
    }
}
