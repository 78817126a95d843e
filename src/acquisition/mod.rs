//! State acquisition: what the heater is doing, read off its indicator LEDs.
//!
//! [`latch::SignalLatch`] is the interrupt-shared half.  [`StateMonitor`] is
//! the main-loop half: it polls liveness, derives the full [`StateBits`]
//! (including the analog "turned on" sense) and drives the override output.

pub mod latch;

use core::fmt;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::app::ports::{HeaterSignals, OverrideLine, SenseInput};
use crate::timing::Deadline;
use latch::{ErrorSeen, LatchSnapshot, SignalLatch};

/// Number of one-hot mode LEDs.
pub const MAX_MODE: u8 = 4;
/// Mode LED nibble within the sampled bits.
pub const MODE_MASK: u8 = 0x0F;
/// Bits that come straight from the indicator lines.
pub const SAMPLED_MASK: u8 = 0b0011_1111;
/// Lines that read low when lit.  All six indicators are active-low.
pub const ACTIVE_LOW_MASK: u8 = 0b0011_1111;

/// ADC counts above which the sense line means "turned on".
pub const SENSE_THRESHOLD: u16 = 2048;

/// Liveness poll interval.
pub const LIVENESS_POLL_MS: i32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum Mode {
    #[default]
    Unknown = 0,
    Working = 1,
    Timer = 2,
    Off = 3,
    HotWater = 4,
}

impl Mode {
    pub const COUNT: usize = 5;

    /// Out-of-range indices map to `Unknown`.
    pub const fn from_index(i: u8) -> Self {
        match i {
            1 => Self::Working,
            2 => Self::Timer,
            3 => Self::Off,
            4 => Self::HotWater,
            _ => Self::Unknown,
        }
    }

    pub const fn is_known(self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Unknown => "unknown",
            Self::Working => "working",
            Self::Timer => "timer",
            Self::Off => "off",
            Self::HotWater => "hotwater",
        })
    }
}

/// Derived heater state.  Built by [`StateMonitor::state`], never edited
/// by policy code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StateBits(u8);

impl StateBits {
    pub const WORKING_LED: u8 = 1 << 0;
    pub const TIMER_LED: u8 = 1 << 1;
    pub const OFF_LED: u8 = 1 << 2;
    pub const HOTWATER_LED: u8 = 1 << 3;
    pub const ERROR_LED: u8 = 1 << 4;
    pub const ACTIVE_LED: u8 = 1 << 5;
    pub const TURNED_ON: u8 = 1 << 6;

    pub const SIZE: usize = 7;

    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn contains(self, mask: u8) -> bool {
        self.0 & mask == mask
    }
}

/// Bit 0 first, as `0`/`1` characters.
impl fmt::Display for StateBits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in 0..Self::SIZE {
            f.write_str(if self.0 & (1 << i) != 0 { "1" } else { "0" })?;
        }
        Ok(())
    }
}

/// Main-loop view of the heater.
pub struct StateMonitor<'a, O, S> {
    latch: &'a SignalLatch,
    override_line: O,
    sense: S,
    force_on: bool,
    liveness: Deadline,
}

impl<'a, O: OverrideLine, S: SenseInput> StateMonitor<'a, O, S> {
    /// The override line starts released.
    pub fn new(latch: &'a SignalLatch, mut override_line: O, sense: S) -> Self {
        override_line.release();
        Self {
            latch,
            override_line,
            sense,
            force_on: false,
            liveness: Deadline::new(),
        }
    }

    /// Advance the liveness poll.  Returns `true` when this call found the
    /// unit stalled and degraded it to `Unknown`.
    pub fn poll(&mut self, now_ms: u32) -> bool {
        if !self.liveness.enabled() {
            self.liveness.reset(LIVENESS_POLL_MS, now_ms);
            return false;
        }
        if !self.liveness.check(now_ms) {
            return false;
        }
        self.liveness.reset(LIVENESS_POLL_MS, now_ms);
        let stalled = self.latch.check_liveness(now_ms);
        if stalled {
            info!("indicator lines silent, mode unknown");
        }
        stalled
    }

    pub fn state(&mut self) -> StateBits {
        let snap = self.latch.snapshot();
        self.build_state(&snap)
    }

    pub fn mode(&self) -> Mode {
        self.latch.mode()
    }

    /// Last time `mode` was entered, in clock milliseconds.
    pub fn mode_time(&self, mode: Mode) -> u32 {
        self.latch.mode_since(mode)
    }

    /// Mode and state from a single snapshot.
    pub fn mode_and_state(&mut self) -> (Mode, StateBits) {
        let snap = self.latch.snapshot();
        (snap.mode, self.build_state(&snap))
    }

    pub fn error_bits(&self) -> u8 {
        u8::from(self.latch.snapshot().error_seen == ErrorSeen::Twice)
    }

    pub fn active_bits(&mut self) -> u8 {
        let snap = self.latch.snapshot();
        let led = u8::from(snap.bits.contains(StateBits::ACTIVE_LED));
        led | (u8::from(self.turned_on(&snap)) << 1)
    }

    pub fn set_force_on(&mut self, on: bool) {
        if on == self.force_on {
            return;
        }
        if on {
            self.override_line.drive_high();
        } else {
            self.override_line.release();
        }
        debug!("override {}", if on { "asserted" } else { "released" });
        self.force_on = on;
    }

    pub fn is_force_on(&self) -> bool {
        self.force_on
    }

    fn build_state(&mut self, snap: &LatchSnapshot) -> StateBits {
        let mut bits = snap.bits.bits() & (MODE_MASK | StateBits::ACTIVE_LED);
        if snap.error_seen == ErrorSeen::Twice {
            bits |= StateBits::ERROR_LED;
        }
        if self.turned_on(snap) {
            bits |= StateBits::TURNED_ON;
        }
        StateBits::from_bits(bits)
    }

    /// Forced on, or the sense line above threshold.  The ADC is read at
    /// most once per edge generation.
    fn turned_on(&mut self, snap: &LatchSnapshot) -> bool {
        if self.force_on {
            return true;
        }
        if let Some(on) = snap.sense_cache {
            return on;
        }
        let on = self.sense.read_raw() > SENSE_THRESHOLD;
        self.latch.cache_sense(snap.generation, on);
        on
    }
}

impl<O: OverrideLine, S: SenseInput> HeaterSignals for StateMonitor<'_, O, S> {
    fn active_bits(&mut self) -> u8 {
        StateMonitor::active_bits(self)
    }

    fn mode(&self) -> Mode {
        StateMonitor::mode(self)
    }

    fn set_force_on(&mut self, on: bool) {
        StateMonitor::set_force_on(self, on);
    }
}
