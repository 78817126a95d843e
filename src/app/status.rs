//! Report lines for the serial link.
//!
//! ```text
//! [C:1 +21.50 e0o2z-;s1000011 u3d014502]*      state, periodic
//! [C:1 +21.50 e0o2z5;s1000011 u3d014502]f*     state, forced on
//! [CC M1 H0 F2 P30 D5 T5{A+20.00 P+10.00}]*    config
//! [CZ 0:+21.50 5:+18.00]*                      zones
//! [CS w30 d-0.20 i12-0.50 a5+1.20]*           activity statistics
//! ```

use core::fmt::{self, Write};

use log::warn;

use super::events::ReportLine;
use crate::acquisition::{Mode, StateBits};
use crate::config::{HeaterConfig, ThresholdKind};
use crate::control::{ActivityStats, History};
use crate::sensors::temperature::Temp;
use crate::sensors::N_ZONES;
use crate::timing::{elapsed, DAY, HOUR, MINUTE, SECOND};

/// Why a state dump was produced.  Printed after the closing bracket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DumpTag {
    Periodic,
    First,
    Reply,
    ModeChanged,
    PowerLost,
    PowerBack,
    Error,
    /// Error cleared or override released.
    Normal,
    Forced,
    Config,
    HotWaterTimeout,
}

impl DumpTag {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Periodic => "",
            Self::First => "*",
            Self::Reply => "?",
            Self::ModeChanged => "b",
            Self::PowerLost => "0",
            Self::PowerBack => "1",
            Self::Error => "e",
            Self::Normal => "n",
            Self::Forced => "f",
            Self::Config => "c",
            Self::HotWaterTimeout => "h",
        }
    }
}

/// Everything a state dump shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateReport {
    pub mode: Mode,
    pub zone0: Temp,
    pub error: u8,
    pub active: u8,
    pub forced_zone: Option<u8>,
    pub state: StateBits,
}

/// Day counter that survives the 49.7-day wrap of the millisecond clock,
/// as long as it is advanced at least once per wrap.
#[derive(Debug, Clone, Copy, Default)]
pub struct Uptime {
    day_start_ms: u32,
    days: u32,
}

impl Uptime {
    pub const fn new(now_ms: u32) -> Self {
        Self {
            day_start_ms: now_ms,
            days: 0,
        }
    }

    pub fn advance(&mut self, now_ms: u32) {
        while elapsed(now_ms, self.day_start_ms) >= DAY {
            self.day_start_ms = self.day_start_ms.wrapping_add(DAY);
            self.days += 1;
        }
    }

    pub const fn days(&self) -> u32 {
        self.days
    }

    /// Milliseconds into the current day.
    pub fn day_ms(&self, now_ms: u32) -> u32 {
        elapsed(now_ms, self.day_start_ms) % DAY
    }
}

pub fn state_line(r: &StateReport, uptime: &Uptime, now_ms: u32, tag: DumpTag) -> ReportLine {
    let mut out = ReportLine::new();
    let res = write_state(&mut out, r, uptime, now_ms, tag);
    finish(out, res)
}

pub fn config_line(cfg: &HeaterConfig) -> ReportLine {
    let mut out = ReportLine::new();
    let res = write_config(&mut out, cfg);
    finish(out, res)
}

/// Valid zone readings only.
pub fn zones_line(mut reading: impl FnMut(usize) -> Temp) -> ReportLine {
    let mut out = ReportLine::new();
    let res = (|| {
        out.write_str("[CZ")?;
        for z in 0..N_ZONES {
            let t = reading(z);
            if t.valid() {
                write!(out, " {}:{}", z, t)?;
            }
        }
        out.write_str("]*")
    })();
    finish(out, res)
}

/// Working minutes per hour and drift over the history window, then the
/// length and temperature change of the last inactive and active phases.
pub fn stats_line(stats: &ActivityStats, history: &History) -> ReportLine {
    let mut out = ReportLine::new();
    let res = write!(
        out,
        "[CS w{} d{} i{}{} a{}{}]*",
        history.work_minutes(),
        history.drift(),
        stats.inactive_minutes(),
        stats.inactive_dt(),
        stats.active_minutes(),
        stats.active_dt()
    );
    finish(out, res)
}

fn write_state(
    out: &mut ReportLine,
    r: &StateReport,
    uptime: &Uptime,
    now_ms: u32,
    tag: DumpTag,
) -> fmt::Result {
    write!(out, "[C:{} {} e{}o{}z", r.mode as u8, r.zone0, r.error, r.active)?;
    match r.forced_zone {
        Some(z) => write!(out, "{}", z)?,
        None => out.write_char('-')?,
    }
    let t = uptime.day_ms(now_ms);
    write!(
        out,
        ";s{} u{}d{:02}{:02}{:02}]{}*",
        r.state,
        uptime.days(),
        t / HOUR,
        t % HOUR / MINUTE,
        t % MINUTE / SECOND,
        tag.as_str()
    )
}

fn write_config(out: &mut ReportLine, cfg: &HeaterConfig) -> fmt::Result {
    write!(
        out,
        "[CC M{} H{} F{} P{} D{}",
        cfg.saved_mode as u8, cfg.hotwater_min, cfg.force as u8, cfg.period_min, cfg.duration_min
    )?;
    for (i, z) in cfg.zones.iter().enumerate() {
        if !z.any_set() {
            continue;
        }
        write!(out, " T{}{{", i)?;
        let mut first = true;
        for kind in [ThresholdKind::Active, ThresholdKind::Inactive, ThresholdKind::Periodic] {
            let t = z.get(kind);
            if !t.valid() {
                continue;
            }
            if !first {
                out.write_char(' ')?;
            }
            write!(out, "{}{}", kind.letter(), t)?;
            first = false;
        }
        out.write_char('}')?;
    }
    out.write_str("]*")
}

/// Lines are sized for the worst case; an overflow keeps what fitted.
fn finish(out: ReportLine, res: fmt::Result) -> ReportLine {
    if res.is_err() {
        warn!("report line truncated at {} bytes", out.len());
    }
    out
}
