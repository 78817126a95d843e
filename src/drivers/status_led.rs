//! Status LED driver.
//!
//! One discrete LED on any `embedded_hal` output pin.  The main loop calls
//! [`StatusLed::tick`] every pass; the LED blinks fast while the override
//! is asserted and slowly otherwise, so a stuck loop shows as a frozen LED.

use embedded_hal::digital::OutputPin;
use log::warn;

use crate::timing::Deadline;

/// Half-period while the heater is being forced on.
pub const FORCED_BLINK_MS: i32 = 250;
/// Half-period in normal supervision.
pub const IDLE_BLINK_MS: i32 = 1_000;

pub struct StatusLed<P> {
    pin: P,
    lit: bool,
    blink: Deadline,
}

impl<P: OutputPin> StatusLed<P> {
    pub fn new(pin: P) -> Self {
        Self {
            pin,
            lit: false,
            blink: Deadline::new(),
        }
    }

    /// Toggle the LED when its half-period elapses.
    pub fn tick(&mut self, now_ms: u32, forced: bool) {
        let half = if forced { FORCED_BLINK_MS } else { IDLE_BLINK_MS };
        if !self.blink.enabled() {
            self.blink.reset(half, now_ms);
            return;
        }
        if !self.blink.check(now_ms) {
            return;
        }
        self.lit = !self.lit;
        let res = if self.lit {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        };
        if res.is_err() {
            warn!("status LED pin write failed");
        }
        self.blink.reset(half, now_ms);
    }

    pub fn is_lit(&self) -> bool {
        self.lit
    }
}
