//! Polled timing primitives built on a wrapping millisecond clock.
//!
//! Everything here is owned and advanced by the main loop.  None of it is
//! touched from interrupt context, so no locking is involved.  The clock is
//! a free-running `u32` millisecond counter that wraps roughly every 49.7
//! days; all arithmetic is wrapping.

pub mod deadline;
pub mod debounce;
pub mod expiring;

pub use deadline::Deadline;
pub use debounce::Debouncer;
pub use expiring::{Expirable, Expiring, ExpiringPair};

pub const SECOND: u32 = 1_000;
pub const MINUTE: u32 = 60 * SECOND;
pub const HOUR: u32 = 60 * MINUTE;
pub const DAY: u32 = 24 * HOUR;

/// Milliseconds elapsed from `since` to `now`, correct across one wrap.
#[inline]
pub fn elapsed(now_ms: u32, since_ms: u32) -> u32 {
    now_ms.wrapping_sub(since_ms)
}
