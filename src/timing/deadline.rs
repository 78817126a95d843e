//! Single-shot, pollable deadline.
//!
//! `check()` returns `true` exactly once after the deadline passes and
//! disarms the timer as a side effect.  There is no auto-repeat; callers
//! that want a period re-arm with [`Deadline::reset`] after it fires.

/// Sentinel for "not armed".  A computed deadline that lands on it is
/// nudged to 1.
const DISARMED: u32 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    at: u32,
}

impl Default for Deadline {
    fn default() -> Self {
        Self::new()
    }
}

impl Deadline {
    /// A disarmed deadline.
    pub const fn new() -> Self {
        Self { at: DISARMED }
    }

    /// A deadline armed to fire `interval_ms` after `now_ms`.
    pub fn armed(interval_ms: i32, now_ms: u32) -> Self {
        let mut d = Self::new();
        d.reset(interval_ms, now_ms);
        d
    }

    /// Arm to fire `interval_ms` from `now_ms`.  Negative intervals clamp
    /// to zero (fires on the next check).
    pub fn reset(&mut self, interval_ms: i32, now_ms: u32) {
        let interval = interval_ms.max(0) as u32;
        let at = now_ms.wrapping_add(interval);
        self.at = if at == DISARMED { 1 } else { at };
    }

    /// `true` the first time it is polled at or after the deadline.
    pub fn check(&mut self, now_ms: u32) -> bool {
        if !self.enabled() {
            return false;
        }
        // Signed distance keeps the comparison valid across clock wrap.
        if now_ms.wrapping_sub(self.at) as i32 >= 0 {
            self.disable();
            return true;
        }
        false
    }

    pub fn enabled(&self) -> bool {
        self.at != DISARMED
    }

    pub fn disable(&mut self) {
        self.at = DISARMED;
    }
}
