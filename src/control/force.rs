//! Forcing engine: decides, once per control cycle, whether the override
//! line should hold the heater on.
//!
//! ```text
//!            ┌── On ───▶ assert
//!  force ────┼── Off ──▶ release
//!            └── Auto ─▶ check_auto ──reason──▶ assert
//!                            │ none
//!                            ▼
//!                       check_duration ──elapsed──▶ release
//! ```
//!
//! A forced cycle ends when the heater has been active for the configured
//! duration, or earlier if the mode or force setting changes under it.  A
//! cancelled cycle stays cancelled until the heater goes inactive again.

use log::{debug, info};

use crate::acquisition::Mode;
use crate::app::ports::{HeaterSignals, ZoneReadings};
use crate::config::{ForceMode, HeaterConfig};
use crate::sensors::N_ZONES;
use crate::timing::elapsed;

/// Why `check_auto` wants the heater on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForceReason {
    None,
    /// A zone fell below its mode threshold.
    Temperature(u8),
    /// Inactive for the whole period with some zone below its P threshold.
    Periodic,
}

#[derive(Debug)]
pub struct ForceEngine {
    was_active: bool,
    last_transition_ms: u32,
    was_forced: bool,
    canceled: bool,
    forced_mode: Mode,
    forced_force: ForceMode,
    forced_zone: Option<u8>,
}

impl Default for ForceEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ForceEngine {
    pub const fn new() -> Self {
        Self {
            was_active: false,
            last_transition_ms: 0,
            was_forced: false,
            canceled: false,
            forced_mode: Mode::Unknown,
            forced_force: ForceMode::Off,
            forced_zone: None,
        }
    }

    /// Run one policy evaluation.  Returns `true` only when the override
    /// was asserted because of a zone temperature.
    pub fn check<H, Z>(
        &mut self,
        now_ms: u32,
        signals: &mut H,
        config: &HeaterConfig,
        zones: &mut Z,
    ) -> bool
    where
        H: HeaterSignals + ?Sized,
        Z: ZoneReadings + ?Sized,
    {
        let is_active = signals.active_bits() != 0;
        if is_active != self.was_active {
            debug!("activity {} -> {}", self.was_active, is_active);
            self.last_transition_ms = now_ms;
            self.was_active = is_active;
        }

        match config.force {
            ForceMode::On => {
                self.forced_zone = None;
                signals.set_force_on(true);
                false
            }
            ForceMode::Off => {
                self.forced_zone = None;
                signals.set_force_on(false);
                false
            }
            ForceMode::Auto => {
                let mode = signals.mode();
                match self.check_auto(now_ms, mode, config, zones) {
                    ForceReason::None => {
                        if self.check_duration(now_ms, mode, config) {
                            signals.set_force_on(false);
                        }
                        false
                    }
                    reason => {
                        signals.set_force_on(true);
                        matches!(reason, ForceReason::Temperature(_))
                    }
                }
            }
        }
    }

    /// First zone currently below its threshold for the heater's mode, as
    /// of the last Auto check.
    pub fn forced_zone(&self) -> Option<u8> {
        self.forced_zone
    }

    /// Whether the current active cycle was cancelled.
    pub fn is_canceled(&self) -> bool {
        self.canceled
    }

    fn check_auto<Z>(
        &mut self,
        now_ms: u32,
        mode: Mode,
        config: &HeaterConfig,
        zones: &mut Z,
    ) -> ForceReason
    where
        Z: ZoneReadings + ?Sized,
    {
        // Refreshed on every call; only an inactive heater is forced by it.
        self.forced_zone = config.zones.iter().enumerate().find_map(|(i, z)| {
            let threshold = z.for_mode(mode);
            (threshold.valid() && zones.reading(i, now_ms).is_below(threshold)).then_some(i as u8)
        });
        if self.was_active {
            return ForceReason::None;
        }
        if let Some(zone) = self.forced_zone {
            info!("zone {} below threshold in {} mode, forcing", zone, mode);
            return ForceReason::Temperature(zone);
        }

        let period = config.period_ms();
        if period == 0 || config.duration_ms() == 0 {
            return ForceReason::None;
        }
        if elapsed(now_ms, self.last_transition_ms) < period {
            return ForceReason::None;
        }
        let any_cold = (0..N_ZONES).any(|i| {
            let p = config.zones[i].periodic;
            p.valid() && zones.reading(i, now_ms).is_below(p)
        });
        if any_cold {
            info!("inactive for {} min, periodic forcing", config.period_min);
            ForceReason::Periodic
        } else {
            ForceReason::None
        }
    }

    /// Returns `true` once the forced cycle is over and the override should
    /// be released.
    fn check_duration(&mut self, now_ms: u32, mode: Mode, config: &HeaterConfig) -> bool {
        if !self.was_active {
            self.was_forced = false;
            self.canceled = false;
            return false;
        }
        if self.canceled {
            return true;
        }

        let mut force = elapsed(now_ms, self.last_transition_ms) < config.duration_ms();
        if force {
            if !self.was_forced {
                self.forced_mode = mode;
                self.forced_force = config.force;
            } else if self.forced_mode != mode || self.forced_force != config.force {
                info!("mode {} -> {} while forced, cancelling", self.forced_mode, mode);
                self.canceled = true;
                force = false;
            }
        }
        self.was_forced = force;
        !force
    }
}
