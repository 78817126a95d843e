//! Values that invalidate themselves when not refreshed in time.
//!
//! [`Expiring`] holds one value; [`ExpiringPair`] fuses two independently
//! arriving readings by reporting the larger of the last two.  Both rely on
//! the [`Expirable`] capability: an explicit invalid sentinel that orders
//! below every valid value.

use super::deadline::Deadline;

/// A value type with an explicit "invalid" state.
///
/// Implementors must make `invalid()` compare less than every valid value,
/// so that `max` over a pair always prefers a valid reading.
pub trait Expirable: Copy + Ord {
    fn invalid() -> Self;
    fn is_valid(&self) -> bool;
}

/// A single value that reverts to `T::invalid()` `INTERVAL_MS` after the
/// last valid write.
#[derive(Debug, Clone, Copy)]
pub struct Expiring<T, const INTERVAL_MS: u32> {
    value: T,
    deadline: Deadline,
}

impl<T: Expirable, const INTERVAL_MS: u32> Default for Expiring<T, INTERVAL_MS> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Expirable, const INTERVAL_MS: u32> Expiring<T, INTERVAL_MS> {
    pub fn new() -> Self {
        Self {
            value: T::invalid(),
            deadline: Deadline::new(),
        }
    }

    pub fn set_value(&mut self, value: T, now_ms: u32) {
        if value.is_valid() {
            self.deadline.reset(INTERVAL_MS as i32, now_ms);
        } else {
            self.deadline.disable();
        }
        self.value = value;
    }

    pub fn get(&mut self, now_ms: u32) -> T {
        if self.deadline.check(now_ms) {
            self.value = T::invalid();
        }
        self.value
    }
}

/// Two-slot expiring value.  Received readings alternate between the
/// slots; `get()` reports the larger one.
#[derive(Debug, Clone, Copy)]
pub struct ExpiringPair<T, const INTERVAL_MS: u32> {
    slots: [T; 2],
    next: usize,
    deadline: Deadline,
}

impl<T: Expirable, const INTERVAL_MS: u32> Default for ExpiringPair<T, INTERVAL_MS> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Expirable, const INTERVAL_MS: u32> ExpiringPair<T, INTERVAL_MS> {
    pub fn new() -> Self {
        Self {
            slots: [T::invalid(); 2],
            next: 0,
            deadline: Deadline::new(),
        }
    }

    /// Overwrite both slots with a locally measured value.
    pub fn set_value(&mut self, value: T, now_ms: u32) {
        if value.is_valid() {
            self.deadline.reset(INTERVAL_MS as i32, now_ms);
        } else {
            self.deadline.disable();
        }
        self.slots = [value; 2];
        self.next = 0;
    }

    /// Store a remotely received reading in the next slot (round-robin).
    ///
    /// An invalid reading does not touch the deadline, so the other slot
    /// keeps its own expiry.
    pub fn set_received(&mut self, value: T, now_ms: u32) {
        if value.is_valid() {
            self.deadline.reset(INTERVAL_MS as i32, now_ms);
        }
        self.slots[self.next] = value;
        self.next ^= 1;
    }

    pub fn get(&mut self, now_ms: u32) -> T {
        if self.deadline.check(now_ms) {
            self.slots = [T::invalid(); 2];
        }
        self.slots[0].max(self.slots[1])
    }
}
