//! Reset-request supervision.
//!
//! When a fault condition holds for long enough, the supervisor asks the
//! host on the serial link to power-cycle the heater.  Each request doubles
//! the wait before the next one; a quiet spell of one full wait restores
//! the initial interval.
//!
//! ```text
//!  condition ──held RESET_WAIT_MS──▶ request ──held 2×──▶ request ──4×──▶ …
//!  clear ──held current wait──▶ wait back to RESET_WAIT_MS
//! ```

use log::{info, warn};

use crate::sensors::temperature::Temp;
use crate::timing::{elapsed, DAY, MINUTE};

/// Initial wait before the first request.
pub const RESET_WAIT_MS: u32 = 3 * MINUTE;
/// Backoff ceiling, below half the clock range.
pub const MAX_RESET_WAIT_MS: u32 = 16 * DAY;

/// Heater counted as stuck once it has been working this long...
pub const STUCK_ACTIVE_MINUTES: u32 = 50;
/// ...while losing at least this much per hour...
pub const STUCK_DRIFT: Temp = Temp::from_centi(-10);
/// ...and the room is colder than this.
pub const STUCK_BELOW: Temp = Temp::from_centi(2_100);

/// Inputs the reset condition is evaluated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResetInputs {
    /// Debounced heater error.
    pub error: bool,
    pub active: bool,
    pub active_minutes: u32,
    /// Temperature drift over the last hour.
    pub drift: Temp,
    /// Local (zone 0) temperature.
    pub temp: Temp,
}

impl ResetInputs {
    /// An error, or a heater that has been "working" for a long time while
    /// the room keeps cooling.
    pub fn reset_wanted(&self) -> bool {
        if self.error {
            return true;
        }
        self.active
            && self.active_minutes >= STUCK_ACTIVE_MINUTES
            && self.drift < STUCK_DRIFT
            && self.temp.is_below(STUCK_BELOW)
    }
}

#[derive(Debug, Clone)]
pub struct ResetSupervisor {
    condition_since: Option<u32>,
    ok_since: Option<u32>,
    wait_ms: u32,
}

impl Default for ResetSupervisor {
    fn default() -> Self {
        Self::new()
    }
}

impl ResetSupervisor {
    pub const fn new() -> Self {
        Self {
            condition_since: None,
            ok_since: None,
            wait_ms: RESET_WAIT_MS,
        }
    }

    /// Returns `true` when a reset request is due now.
    pub fn check(&mut self, now_ms: u32, condition: bool) -> bool {
        if !condition {
            self.condition_since = None;
            match self.ok_since {
                None => self.ok_since = Some(now_ms),
                Some(since) => {
                    if self.wait_ms != RESET_WAIT_MS && elapsed(now_ms, since) > self.wait_ms {
                        info!("reset condition clear for {} ms, backoff restored", self.wait_ms);
                        self.wait_ms = RESET_WAIT_MS;
                    }
                }
            }
            return false;
        }

        self.ok_since = None;
        let Some(since) = self.condition_since else {
            self.condition_since = Some(now_ms);
            return false;
        };
        if elapsed(now_ms, since) < self.wait_ms {
            return false;
        }
        warn!("reset condition held for {} ms, requesting reset", self.wait_ms);
        self.wait_ms = self.wait_ms.saturating_mul(2).min(MAX_RESET_WAIT_MS);
        true
    }

    /// Current wait before the next request.
    pub fn wait_ms(&self) -> u32 {
        self.wait_ms
    }
}
