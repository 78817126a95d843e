//! Heater activity statistics fed by the local (zone 0) temperature.
//!
//! [`ActivityStats`] measures the current active or inactive phase: how
//! many minutes it has lasted and how far the temperature moved since it
//! began.  [`History`] keeps an hour of 15-second samples and derives the
//! heater's working minutes per hour and the temperature drift over that
//! hour.  Both skip ticks without a valid reading.

use heapless::Deque;

use crate::sensors::temperature::Temp;
use crate::timing::{elapsed, Deadline, MINUTE, SECOND};

/// History sample period.
pub const HISTORY_INTERVAL_MS: i32 = 15 * SECOND as i32;
/// One hour of samples.
pub const HISTORY_LEN: usize = 240;
/// Working time is reported per this many minutes.
const WORK_SCALE_MIN: u32 = 60;

/// Difference `to - from`, saturating short of the invalid sentinel.
fn delta(to: Temp, from: Temp) -> Temp {
    let d = i32::from(to.centi()) - i32::from(from.centi());
    Temp::from_centi(d.clamp(i32::from(i16::MIN) + 1, i32::from(i16::MAX)) as i16)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Phase {
    started_ms: u32,
    start_temp: Temp,
    minutes: u32,
    dt: Temp,
}

impl Phase {
    const fn new(now_ms: u32, temp: Temp) -> Self {
        Self {
            started_ms: now_ms,
            start_temp: temp,
            minutes: 0,
            dt: Temp::from_centi(0),
        }
    }

    fn update(&mut self, now_ms: u32, temp: Temp) {
        self.minutes = elapsed(now_ms, self.started_ms) / MINUTE;
        self.dt = delta(temp, self.start_temp);
    }
}

/// Length and temperature change of the last active and inactive phases.
#[derive(Debug, Clone, Default)]
pub struct ActivityStats {
    /// Activity flag at the last valid sample; `None` before the first.
    was_active: Option<bool>,
    active: Option<Phase>,
    inactive: Option<Phase>,
}

impl ActivityStats {
    pub const fn new() -> Self {
        Self {
            was_active: None,
            active: None,
            inactive: None,
        }
    }

    pub fn update(&mut self, now_ms: u32, active: bool, temp: Temp) {
        if !temp.valid() {
            return;
        }
        let slot = if active {
            &mut self.active
        } else {
            &mut self.inactive
        };
        if self.was_active != Some(active) || slot.is_none() {
            *slot = Some(Phase::new(now_ms, temp));
        }
        if let Some(phase) = slot {
            phase.update(now_ms, temp);
        }
        self.was_active = Some(active);
    }

    /// Heater activity seen at the last valid sample.
    pub fn is_active(&self) -> bool {
        self.was_active == Some(true)
    }

    /// Minutes the current (or last) active phase has lasted.
    pub fn active_minutes(&self) -> u32 {
        self.active.map_or(0, |p| p.minutes)
    }

    pub fn active_dt(&self) -> Temp {
        self.active.map_or(Temp::from_centi(0), |p| p.dt)
    }

    pub fn inactive_minutes(&self) -> u32 {
        self.inactive.map_or(0, |p| p.minutes)
    }

    pub fn inactive_dt(&self) -> Temp {
        self.inactive.map_or(Temp::from_centi(0), |p| p.dt)
    }
}

#[derive(Debug, Clone, Copy)]
struct Sample {
    working: bool,
    temp: Temp,
}

/// Rolling hour of activity samples.
#[derive(Debug)]
pub struct History {
    samples: Deque<Sample, HISTORY_LEN>,
    working: u32,
    next: Deadline,
    work_minutes: u32,
    drift: Temp,
}

impl History {
    /// First sample is due one interval after `now_ms`.
    pub fn new(now_ms: u32) -> Self {
        Self {
            samples: Deque::new(),
            working: 0,
            next: Deadline::armed(HISTORY_INTERVAL_MS, now_ms),
            work_minutes: 0,
            drift: Temp::from_centi(0),
        }
    }

    pub fn update(&mut self, now_ms: u32, active: bool, temp: Temp) {
        if !temp.valid() || !self.next.check(now_ms) {
            return;
        }
        self.next.reset(HISTORY_INTERVAL_MS, now_ms);

        if self.samples.is_full() {
            if let Some(old) = self.samples.pop_front() {
                self.working -= u32::from(old.working);
            }
        }
        let sample = Sample {
            working: active,
            temp,
        };
        if self.samples.push_back(sample).is_ok() {
            self.working += u32::from(active);
        }

        let n = self.samples.len() as u32;
        self.work_minutes = self.working * WORK_SCALE_MIN / n.max(1);
        self.drift = self
            .samples
            .front()
            .map_or(Temp::from_centi(0), |oldest| delta(temp, oldest.temp));
    }

    /// Working minutes per hour over the recorded window.
    pub fn work_minutes(&self) -> u32 {
        self.work_minutes
    }

    /// Temperature change from the oldest recorded sample to the newest.
    pub fn drift(&self) -> Temp {
        self.drift
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
