//! Interrupt-shared signal latch.
//!
//! The GPIO ISR is the only writer of the sampled bit-set, mode and error
//! tracking; the main loop reads it exclusively through [`SignalLatch::snapshot`]
//! and mutates it only from the 100 ms liveness poll.  Every access, from
//! either side, runs inside `critical_section::with`, which on target masks
//! interrupts for the duration of the copy.
//!
//! ```text
//!  GPIO edge ──▶ on_edge()          ┌──────────────┐
//!                 sample + derive ─▶│  LatchState  │──▶ snapshot() ─▶ main loop
//!  100 ms poll ─▶ check_liveness() ▶│ (cs::Mutex)  │
//!                                   └──────────────┘
//! ```

use core::cell::RefCell;

use critical_section::Mutex;

use super::{Mode, StateBits, ACTIVE_LOW_MASK, MAX_MODE, MODE_MASK, SAMPLED_MASK};
use crate::app::ports::IndicatorLines;
use crate::timing::elapsed;

/// Two error-LED sightings within this window make a logical error.
pub const ERROR_WINDOW_MS: u32 = 2_000;

/// Error-LED sightings recorded by the ISR.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeen {
    None,
    Once,
    Twice,
}

#[derive(Debug)]
struct LatchState {
    bits: u8,
    mode: Mode,
    mode_since_ms: [u32; Mode::COUNT],
    heartbeat: u16,
    last_error_ms: u32,
    error_seen: ErrorSeen,
    /// Bumped on every edge; tags cached analog reads.
    generation: u32,
    sense_cache: Option<bool>,
}

/// Consistent copy of the latch taken with interrupts masked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatchSnapshot {
    pub bits: StateBits,
    pub mode: Mode,
    pub error_seen: ErrorSeen,
    pub generation: u32,
    pub sense_cache: Option<bool>,
}

pub struct SignalLatch {
    state: Mutex<RefCell<LatchState>>,
}

impl Default for SignalLatch {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalLatch {
    pub const fn new() -> Self {
        Self {
            state: Mutex::new(RefCell::new(LatchState {
                bits: 0,
                mode: Mode::Unknown,
                mode_since_ms: [0; Mode::COUNT],
                heartbeat: 0,
                // start "long ago" so the first sighting counts as a fresh one
                last_error_ms: 0u32.wrapping_sub(2 * ERROR_WINDOW_MS),
                error_seen: ErrorSeen::None,
                generation: 0,
                sense_cache: None,
            })),
        }
    }

    /// GPIO edge handler.  Runs in interrupt context: pin reads and bit
    /// arithmetic only.
    pub fn on_edge(&self, lines: &mut impl IndicatorLines, now_ms: u32) {
        let sampled = (lines.sample() ^ ACTIVE_LOW_MASK) & SAMPLED_MASK;
        critical_section::with(|cs| {
            let mut s = self.state.borrow_ref_mut(cs);
            if sampled != s.bits {
                s.bits = sampled;
                let mut mode = s.mode;
                for i in 0..MAX_MODE {
                    if sampled & MODE_MASK == 1 << i {
                        mode = Mode::from_index(i + 1);
                        break;
                    }
                }
                if mode != s.mode {
                    s.mode_since_ms[mode as usize] = now_ms;
                    s.mode = mode;
                }
            }

            if sampled & StateBits::ERROR_LED != 0 {
                s.error_seen = if elapsed(now_ms, s.last_error_ms) < ERROR_WINDOW_MS {
                    ErrorSeen::Twice
                } else {
                    ErrorSeen::Once
                };
                s.last_error_ms = now_ms;
            } else if elapsed(now_ms, s.last_error_ms) > ERROR_WINDOW_MS {
                s.error_seen = ErrorSeen::None;
            }

            s.heartbeat = s.heartbeat.wrapping_add(1);
            s.generation = s.generation.wrapping_add(1);
            s.sense_cache = None;
        });
    }

    /// Liveness poll; call every 100 ms from the main loop.
    ///
    /// Returns `true` when the unit is treated as stalled and the state was
    /// dropped to `Unknown`.
    pub fn check_liveness(&self, now_ms: u32) -> bool {
        critical_section::with(|cs| {
            let mut s = self.state.borrow_ref_mut(cs);
            let stalled = s.heartbeat == 0 && s.mode != Mode::Unknown;
            if stalled {
                s.bits = 0;
                s.mode = Mode::Unknown;
                s.mode_since_ms[Mode::Unknown as usize] = now_ms;
                s.error_seen = ErrorSeen::None;
                s.sense_cache = None;
            } else {
                s.heartbeat = 0;
            }
            // Keep the last sighting within reach so clock wrap cannot
            // make an old error look recent.
            if elapsed(now_ms, s.last_error_ms) > 2 * ERROR_WINDOW_MS {
                s.last_error_ms = now_ms.wrapping_sub(2 * ERROR_WINDOW_MS);
            }
            stalled
        })
    }

    pub fn snapshot(&self) -> LatchSnapshot {
        critical_section::with(|cs| {
            let s = self.state.borrow_ref(cs);
            LatchSnapshot {
                bits: StateBits::from_bits(s.bits),
                mode: s.mode,
                error_seen: s.error_seen,
                generation: s.generation,
                sense_cache: s.sense_cache,
            }
        })
    }

    pub fn mode(&self) -> Mode {
        critical_section::with(|cs| self.state.borrow_ref(cs).mode)
    }

    pub fn mode_since(&self, mode: Mode) -> u32 {
        critical_section::with(|cs| self.state.borrow_ref(cs).mode_since_ms[mode as usize])
    }

    /// Store an analog sense result, unless an edge arrived while it was
    /// being read.
    pub fn cache_sense(&self, generation: u32, on: bool) {
        critical_section::with(|cs| {
            let mut s = self.state.borrow_ref_mut(cs);
            if s.generation == generation {
                s.sense_cache = Some(on);
            }
        });
    }
}
