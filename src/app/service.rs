//! Application controller: the main-loop orchestrator.
//!
//! [`Controller`] owns the state monitor, forcing engine, zone readings and
//! runtime config.  All outside I/O flows through port traits passed in at
//! call sites, so the whole loop runs on the host against mock adapters.
//!
//! ```text
//!  SerialPort ──▶ ┌──────────────────────────────┐ ──▶ EventSink
//!                 │          Controller          │
//!  ConfigPort ◀──▶│ StateMonitor · ForceEngine   │
//!                 │ TempZones · CommandParser    │
//!                 │ ActivityStats · History      │
//!                 │ ResetSupervisor              │
//!                 └──────────────────────────────┘
//! ```

use log::{info, warn};

use crate::acquisition::{Mode, StateMonitor};
use crate::app::ports::{ConfigPort, OverrideLine, SenseInput};
use crate::config::HeaterConfig;
use crate::control::{ActivityStats, ForceEngine, History, ResetInputs, ResetSupervisor};
use crate::error::Result;
use crate::sensors::{TempZones, N_ZONES};
use crate::timing::{elapsed, Deadline, Debouncer, MINUTE};

use super::commands::{Command, CommandError, CommandParser};
use super::events::AppEvent;
use super::ports::{EventSink, SerialPort};
use super::status::{self, DumpTag, StateReport, Uptime};

/// First state dump after start.
pub const FIRST_DUMP_MS: i32 = 2_000;
/// Nominal interval between periodic state dumps.
pub const DUMP_INTERVAL_MS: i32 = 60_000;
/// Periodic dumps are spread by up to this much either way.
pub const DUMP_SKEW_MS: u32 = 5_000;

// ───────────────────────────────────────────────────────────────
// Controller
// ───────────────────────────────────────────────────────────────

pub struct Controller<'a, O, S> {
    monitor: StateMonitor<'a, O, S>,
    engine: ForceEngine,
    zones: TempZones,
    config: HeaterConfig,
    parser: CommandParser,
    error: Debouncer<bool>,
    error_reported: bool,
    last_mode: Mode,
    hotwater_reported: bool,
    activity: ActivityStats,
    history: History,
    reset: ResetSupervisor,
    dump: Deadline,
    first_dump: bool,
    uptime: Uptime,
    rng: u32,
}

impl<'a, O: OverrideLine, S: SenseInput> Controller<'a, O, S> {
    /// Does **not** start dumping: call [`start`](Self::start) next.
    pub fn new(monitor: StateMonitor<'a, O, S>, config: HeaterConfig) -> Self {
        Self {
            monitor,
            engine: ForceEngine::new(),
            zones: TempZones::new(),
            config,
            parser: CommandParser::new(),
            error: Debouncer::new(false),
            error_reported: false,
            last_mode: Mode::Unknown,
            hotwater_reported: false,
            activity: ActivityStats::new(),
            history: History::new(0),
            reset: ResetSupervisor::new(),
            dump: Deadline::new(),
            first_dump: true,
            uptime: Uptime::new(0),
            rng: 1,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    pub fn start(&mut self, now_ms: u32, sink: &mut impl EventSink) {
        self.uptime = Uptime::new(now_ms);
        self.rng = now_ms | 1;
        self.history = History::new(now_ms);
        self.dump.reset(FIRST_DUMP_MS, now_ms);
        info!(
            "controller started, force={:?} period={}min duration={}min",
            self.config.force, self.config.period_min, self.config.duration_min
        );
        sink.emit(&AppEvent::Started);
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// One main-loop pass: liveness → mode supervision → hot-water limit →
    /// activity statistics → commands → error reporting → reset requests →
    /// forcing → periodic dump.
    pub fn tick(
        &mut self,
        now_ms: u32,
        serial: &mut impl SerialPort,
        store: &mut impl ConfigPort,
        sink: &mut impl EventSink,
    ) {
        self.uptime.advance(now_ms);

        // 1. Liveness
        self.monitor.poll(now_ms);

        // 2. Mode supervision
        self.supervise_mode(now_ms, store, sink);
        self.check_hot_water(now_ms, sink);

        // 3. Activity statistics from the local zone
        let active = self.monitor.active_bits() != 0;
        let local = self.zones.get(0, now_ms);
        self.activity.update(now_ms, active, local);
        self.history.update(now_ms, active, local);

        // 4. Serial commands
        while let Some(b) = serial.read_byte() {
            if let Some(cmd) = self.parser.feed(b) {
                if let Err(e) = self.apply(cmd, now_ms, store, sink) {
                    warn!("{:?}: {}", cmd, e);
                }
            }
        }

        // 5. Debounced error reporting
        let raw = self.monitor.error_bits() != 0;
        let error = self.error.update(raw, now_ms);
        if error != self.error_reported {
            self.error_reported = error;
            if error {
                warn!("heater reports an error");
                sink.emit(&AppEvent::ErrorRaised);
                self.report_state(now_ms, DumpTag::Error, sink);
            } else {
                info!("heater error cleared");
                sink.emit(&AppEvent::ErrorCleared);
                self.report_state(now_ms, DumpTag::Normal, sink);
            }
        }

        // 6. Reset requests
        let inputs = ResetInputs {
            error,
            active: self.activity.is_active(),
            active_minutes: self.activity.active_minutes(),
            drift: self.history.drift(),
            temp: local,
        };
        if self.reset.check(now_ms, inputs.reset_wanted()) {
            sink.emit(&AppEvent::ResetRequest);
        }

        // 7. Forcing
        let was_forced = self.monitor.is_force_on();
        let by_temp = self
            .engine
            .check(now_ms, &mut self.monitor, &self.config, &mut self.zones);
        let forced = self.monitor.is_force_on();
        if forced && !was_forced {
            let zone = if by_temp { self.engine.forced_zone() } else { None };
            sink.emit(&AppEvent::ForcedOn { zone });
            self.report_state(now_ms, DumpTag::Forced, sink);
        } else if !forced && was_forced {
            sink.emit(&AppEvent::ForceReleased);
            self.report_state(now_ms, DumpTag::Normal, sink);
        }

        // 8. Periodic dump
        if self.dump.check(now_ms) {
            let tag = if self.first_dump {
                DumpTag::First
            } else {
                DumpTag::Periodic
            };
            self.first_dump = false;
            self.report_state(now_ms, tag, sink);
            let interval = DUMP_INTERVAL_MS + self.next_skew();
            self.dump.reset(interval, now_ms);
        }
    }

    // ── Command handling ──────────────────────────────────────

    /// Execute one parsed command.  Config edits are validated, applied
    /// immediately and persisted; a failed save keeps the runtime change.
    pub fn apply(
        &mut self,
        cmd: Command,
        now_ms: u32,
        store: &mut impl ConfigPort,
        sink: &mut impl EventSink,
    ) -> Result<()> {
        let mut next = self.config.clone();
        match cmd {
            Command::DumpState => {
                self.report_state(now_ms, DumpTag::Reply, sink);
                return Ok(());
            }
            Command::DumpConfig => {
                sink.emit(&AppEvent::Report(status::config_line(&self.config)));
                return Ok(());
            }
            Command::DumpZones => {
                let zones = &mut self.zones;
                let line = status::zones_line(|z| zones.get(z, now_ms));
                sink.emit(&AppEvent::Report(line));
                return Ok(());
            }
            Command::DumpStats => {
                let line = status::stats_line(&self.activity, &self.history);
                sink.emit(&AppEvent::Report(line));
                return Ok(());
            }
            Command::Received { zone, temp } => {
                check_zone(zone)?;
                self.zones.set_received(usize::from(zone), temp, now_ms);
                return Ok(());
            }
            Command::SetForce(mode) => next.force = mode,
            Command::SetPeriod(min) => next.period_min = min,
            Command::SetDuration(min) => next.duration_min = min,
            Command::SetHotWater(min) => next.hotwater_min = min,
            Command::SetThreshold { zone, kind, temp } => {
                check_zone(zone)?;
                next.zones[usize::from(zone)].set(kind, temp);
            }
        }

        next.validate()?;
        self.config = next;
        info!("config changed by {:?}", cmd);
        self.persist(store);
        sink.emit(&AppEvent::ConfigChanged);
        sink.emit(&AppEvent::Report(status::config_line(&self.config)));
        self.report_state(now_ms, DumpTag::Config, sink);
        Ok(())
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn is_force_on(&self) -> bool {
        self.monitor.is_force_on()
    }

    pub fn config(&self) -> &HeaterConfig {
        &self.config
    }

    pub fn engine(&self) -> &ForceEngine {
        &self.engine
    }

    pub fn activity(&self) -> &ActivityStats {
        &self.activity
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn monitor(&mut self) -> &mut StateMonitor<'a, O, S> {
        &mut self.monitor
    }

    /// Local zone measurements enter here.
    pub fn zones(&mut self) -> &mut TempZones {
        &mut self.zones
    }

    pub fn state_report(&mut self, now_ms: u32) -> StateReport {
        let (mode, state) = self.monitor.mode_and_state();
        StateReport {
            mode,
            zone0: self.zones.get(0, now_ms),
            error: self.monitor.error_bits(),
            active: self.monitor.active_bits(),
            forced_zone: self.engine.forced_zone(),
            state,
        }
    }

    // ── Internals ─────────────────────────────────────────────

    fn supervise_mode(
        &mut self,
        now_ms: u32,
        store: &mut impl ConfigPort,
        sink: &mut impl EventSink,
    ) {
        let mode = self.monitor.mode();
        if mode == self.last_mode {
            return;
        }
        let from = self.last_mode;
        self.last_mode = mode;

        let tag = match (from.is_known(), mode.is_known()) {
            (true, false) => {
                warn!("heater signals lost in {} mode", from);
                sink.emit(&AppEvent::PowerLost);
                DumpTag::PowerLost
            }
            (false, _) => {
                info!("heater signals back in {} mode", mode);
                sink.emit(&AppEvent::PowerBack);
                DumpTag::PowerBack
            }
            (true, true) => {
                info!("mode {} -> {}", from, mode);
                sink.emit(&AppEvent::ModeChanged { from, to: mode });
                DumpTag::ModeChanged
            }
        };

        if mode.is_known() && mode != self.config.saved_mode {
            self.config.saved_mode = mode;
            self.persist(store);
        }
        self.report_state(now_ms, tag, sink);
    }

    /// Reported once per hot-water stay.
    fn check_hot_water(&mut self, now_ms: u32, sink: &mut impl EventSink) {
        let limit = self.config.hotwater_ms();
        if limit == 0 || self.monitor.mode() != Mode::HotWater {
            self.hotwater_reported = false;
            return;
        }
        let stay = elapsed(now_ms, self.monitor.mode_time(Mode::HotWater));
        if !self.hotwater_reported && stay > limit {
            self.hotwater_reported = true;
            warn!(
                "hot water for {} min, over the {} min limit",
                stay / MINUTE,
                self.config.hotwater_min
            );
            sink.emit(&AppEvent::HotWaterTimeout);
            self.report_state(now_ms, DumpTag::HotWaterTimeout, sink);
        }
    }

    fn report_state(&mut self, now_ms: u32, tag: DumpTag, sink: &mut impl EventSink) {
        let report = self.state_report(now_ms);
        let line = status::state_line(&report, &self.uptime, now_ms, tag);
        sink.emit(&AppEvent::Report(line));
    }

    fn persist(&self, store: &mut impl ConfigPort) {
        if let Err(e) = store.save(&self.config) {
            warn!("config not saved: {}", e);
        }
    }

    /// xorshift32; spreads dumps of several units sharing one link.
    fn next_skew(&mut self) -> i32 {
        let mut x = self.rng;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.rng = x;
        (x % (2 * DUMP_SKEW_MS + 1)) as i32 - DUMP_SKEW_MS as i32
    }
}

fn check_zone(zone: u8) -> core::result::Result<(), CommandError> {
    if usize::from(zone) < N_ZONES {
        Ok(())
    } else {
        Err(CommandError::ZoneOutOfRange(zone))
    }
}
