//! Controller main-loop scenarios: the full path from indicator edges and
//! serial commands through to report lines, events and persisted config.

use heatguard::acquisition::latch::SignalLatch;
use heatguard::acquisition::{Mode, StateBits, StateMonitor};
use heatguard::app::events::AppEvent;
use heatguard::app::service::Controller;
use heatguard::config::{ForceMode, HeaterConfig};
use heatguard::sensors::temperature::Temp;
use heatguard::timing::MINUTE;

use super::mock_hw::{MockLines, MockOverride, MockSense, MockSerial, MockStore, RecordingSink};

struct Rig {
    latch: &'static SignalLatch,
    lines: MockLines,
    line: MockOverride,
    ctl: Controller<'static, MockOverride, MockSense>,
    serial: MockSerial,
    store: MockStore,
    sink: RecordingSink,
}

impl Rig {
    fn new(config: HeaterConfig) -> Self {
        let latch: &'static SignalLatch = Box::leak(Box::new(SignalLatch::new()));
        let line = MockOverride::default();
        let monitor = StateMonitor::new(latch, line.clone(), MockSense::default());
        let mut ctl = Controller::new(monitor, config);
        let mut sink = RecordingSink::default();
        ctl.start(0, &mut sink);
        Self {
            latch,
            lines: MockLines::lit(StateBits::WORKING_LED),
            line,
            ctl,
            serial: MockSerial::default(),
            store: MockStore::default(),
            sink,
        }
    }

    /// One loop pass preceded by an indicator edge.
    fn step(&mut self, now: u32) {
        self.latch.on_edge(&mut self.lines, now);
        self.idle(now);
    }

    /// One loop pass with the indicator lines silent.
    fn idle(&mut self, now: u32) {
        self.ctl
            .tick(now, &mut self.serial, &mut self.store, &mut self.sink);
    }

    fn run(&mut self, from: u32, to: u32) {
        for t in (from..=to).step_by(50) {
            self.step(t);
        }
    }

    fn command(&mut self, cmd: &str, now: u32) {
        self.serial.send(cmd);
        self.step(now);
    }

    fn last_report(&self) -> String {
        self.sink.reports().pop().unwrap_or_default()
    }
}

fn auto_config() -> HeaterConfig {
    let mut cfg = HeaterConfig {
        force: ForceMode::Auto,
        duration_min: 5,
        ..Default::default()
    };
    cfg.zones[1].active = Temp::from_centi(2_000);
    cfg
}

// ── Startup and periodic dumps ────────────────────────────────

#[test]
fn start_reports_power_back_and_saves_mode() {
    let mut rig = Rig::new(HeaterConfig::default());
    assert_eq!(rig.sink.events.first(), Some(&AppEvent::Started));

    rig.step(0);
    assert_eq!(rig.sink.count(&AppEvent::PowerBack), 1);
    assert!(rig.last_report().ends_with("]1*"), "{}", rig.last_report());
    assert_eq!(rig.store.saves.len(), 1);
    assert_eq!(rig.store.saves[0].saved_mode, Mode::Working);
    assert_eq!(rig.ctl.config().saved_mode, Mode::Working);
}

#[test]
fn first_dump_then_skewed_periodic_dumps() {
    let mut rig = Rig::new(HeaterConfig::default());
    rig.run(0, 1_950);
    assert!(!rig.sink.reports().iter().any(|r| r.ends_with("]**")));

    rig.step(2_000);
    let first = rig.last_report();
    assert!(first.starts_with("[C:1 ??.?? e0o0z-;s1000000 u0d000002]"), "{}", first);
    assert!(first.ends_with("]**"));

    rig.sink.clear();
    rig.run(2_050, 67_000);
    let periodic: Vec<_> = rig
        .sink
        .reports()
        .into_iter()
        .filter(|r| r.ends_with("]*") && !r.ends_with("]**"))
        .collect();
    assert_eq!(periodic.len(), 1, "{:?}", periodic);
}

// ── Serial commands ───────────────────────────────────────────

#[test]
fn dump_commands_reply_on_the_link() {
    let mut rig = Rig::new(HeaterConfig::default());
    rig.step(0);

    rig.command("!C?", 50);
    assert!(rig.last_report().ends_with("]?*"));

    rig.command("!CC", 100);
    assert_eq!(rig.last_report(), "[CC M1 H0 F0 P0 D0]*");

    rig.command("!CZ", 150);
    assert_eq!(rig.last_report(), "[CZ]*");
}

#[test]
fn force_commands_drive_the_override() {
    let mut rig = Rig::new(HeaterConfig::default());
    rig.step(0);

    rig.command("!CF1\r", 50);
    assert_eq!(rig.ctl.config().force, ForceMode::On);
    assert_eq!(rig.store.saves.last().map(|c| c.force), Some(ForceMode::On));
    assert_eq!(rig.sink.count(&AppEvent::ConfigChanged), 1);
    assert_eq!(rig.sink.count(&AppEvent::ForcedOn { zone: None }), 1);
    assert!(rig.line.high.get());
    assert!(rig.ctl.is_force_on());
    let reports = rig.sink.reports();
    assert!(reports.iter().any(|r| r.starts_with("[CC M1 H0 F1")));
    assert!(reports.iter().any(|r| r.ends_with("]c*")));
    assert!(rig.last_report().ends_with("]f*"));

    rig.command("!CF0\n", 100);
    assert!(!rig.line.high.get());
    assert_eq!(rig.sink.count(&AppEvent::ForceReleased), 1);
    assert!(rig.last_report().ends_with("]n*"));
}

#[test]
fn invalid_edits_are_rejected_without_saving() {
    let mut rig = Rig::new(HeaterConfig::default());
    rig.step(0);
    let saves = rig.store.saves.len();

    rig.command("!CP250\r", 50);
    rig.command("!CT12A20\r", 100);
    rig.command("!CT3A120\r", 150);

    assert_eq!(rig.store.saves.len(), saves);
    assert_eq!(rig.sink.count(&AppEvent::ConfigChanged), 0);
    assert_eq!(rig.ctl.config().period_min, 0);
    assert!(!rig.ctl.config().zones[3].any_set());
}

#[test]
fn threshold_edit_is_applied_and_persisted() {
    let mut rig = Rig::new(HeaterConfig::default());
    rig.step(0);

    rig.command("!CT4B17.5\r", 50);
    assert_eq!(rig.ctl.config().zones[4].inactive, Temp::from_centi(1_750));
    assert_eq!(rig.store.saves.last().map(|c| c.zones[4].inactive), Some(Temp::from_centi(1_750)));

    // empty value clears
    rig.command("!CT4B\r", 100);
    assert!(!rig.ctl.config().zones[4].any_set());
}

#[test]
fn failed_save_keeps_runtime_change() {
    let mut rig = Rig::new(HeaterConfig::default());
    rig.step(0);
    rig.store.fail = true;

    rig.command("!CD10\r", 50);
    assert_eq!(rig.ctl.config().duration_min, 10);
    assert_eq!(rig.sink.count(&AppEvent::ConfigChanged), 1);
}

// ── Temperature forcing via received readings ─────────────────

#[test]
fn received_reading_triggers_zone_forcing() {
    let mut rig = Rig::new(auto_config());
    rig.step(0);
    assert!(!rig.ctl.is_force_on());

    rig.command("!CR1:18.5\n", 50);
    assert_eq!(rig.sink.count(&AppEvent::ForcedOn { zone: Some(1) }), 1);
    assert!(rig.line.high.get());
    let line = rig.last_report();
    assert!(line.contains("o2z1;"), "{}", line);
    assert!(line.ends_with("]f*"));

    rig.command("!CZ", 100);
    assert_eq!(rig.last_report(), "[CZ 1:+18.50]*");
}

#[test]
fn reading_for_unknown_zone_is_ignored() {
    let mut rig = Rig::new(auto_config());
    rig.step(0);
    rig.command("!CR10:5\n", 50);
    rig.command("!CZ", 100);
    assert_eq!(rig.last_report(), "[CZ]*");
    assert!(!rig.ctl.is_force_on());
}

// ── Mode supervision ──────────────────────────────────────────

#[test]
fn mode_change_is_reported_and_saved() {
    let mut rig = Rig::new(HeaterConfig::default());
    rig.step(0);

    rig.lines.logical = StateBits::TIMER_LED;
    rig.step(50);
    assert_eq!(
        rig.sink.count(&AppEvent::ModeChanged {
            from: Mode::Working,
            to: Mode::Timer
        }),
        1
    );
    assert!(rig.last_report().starts_with("[C:2 "));
    assert!(rig.last_report().ends_with("]b*"));
    assert_eq!(rig.store.saves.last().map(|c| c.saved_mode), Some(Mode::Timer));
}

#[test]
fn silent_lines_report_power_lost_then_back() {
    let mut rig = Rig::new(HeaterConfig::default());
    rig.step(0);
    rig.idle(100);
    assert_eq!(rig.sink.count(&AppEvent::PowerLost), 0);

    rig.idle(200);
    assert_eq!(rig.sink.count(&AppEvent::PowerLost), 1);
    assert!(rig.last_report().starts_with("[C:0 "));
    assert!(rig.last_report().ends_with("]0*"));
    // losing power does not overwrite the saved mode
    assert_eq!(rig.ctl.config().saved_mode, Mode::Working);

    rig.step(250);
    assert_eq!(rig.sink.count(&AppEvent::PowerBack), 2);
}

// ── Error reporting ───────────────────────────────────────────

#[test]
fn blinking_error_is_debounced() {
    let mut rig = Rig::new(HeaterConfig::default());

    for t in (0..=3_000).step_by(50) {
        let error = if (t / 250) % 2 == 0 { StateBits::ERROR_LED } else { 0 };
        rig.lines.logical = StateBits::WORKING_LED | error;
        rig.step(t);
        // second lit sample at 50 ms, then the 1 s dwell
        if t < 1_050 {
            assert_eq!(rig.sink.count(&AppEvent::ErrorRaised), 0, "at {}", t);
        }
    }
    assert_eq!(rig.sink.count(&AppEvent::ErrorRaised), 1);
    assert!(rig.sink.reports().iter().any(|r| r.ends_with("]e*")));

    rig.lines.logical = StateBits::WORKING_LED;
    rig.run(3_050, 8_000);
    assert_eq!(rig.sink.count(&AppEvent::ErrorCleared), 1);
    assert!(rig.sink.reports().iter().any(|r| r.ends_with("]n*")));
}

#[test]
fn persistent_error_requests_reset_with_backoff() {
    let mut rig = Rig::new(HeaterConfig::default());
    rig.lines.logical = StateBits::WORKING_LED | StateBits::ERROR_LED;

    for t in (0..=10 * MINUTE).step_by(1_000) {
        rig.step(t);
        let requests = rig.sink.count(&AppEvent::ResetRequest);
        match t {
            t if t < 3 * MINUTE => assert_eq!(requests, 0, "at {}", t),
            t if (3 * MINUTE + 10_000..6 * MINUTE).contains(&t) => {
                assert_eq!(requests, 1, "at {}", t)
            }
            // the second request waits twice as long
            t if t >= 6 * MINUTE + 10_000 => assert_eq!(requests, 2, "at {}", t),
            _ => {}
        }
    }
    assert_eq!(rig.sink.count(&AppEvent::ErrorRaised), 1);
}

#[test]
fn cleared_error_sends_no_reset_request() {
    let mut rig = Rig::new(HeaterConfig::default());
    rig.lines.logical = StateBits::WORKING_LED | StateBits::ERROR_LED;
    rig.run(0, 2 * MINUTE);
    rig.lines.logical = StateBits::WORKING_LED;
    rig.run(2 * MINUTE + 50, 8 * MINUTE);
    assert_eq!(rig.sink.count(&AppEvent::ErrorCleared), 1);
    assert_eq!(rig.sink.count(&AppEvent::ResetRequest), 0);
}

// ── Hot-water limit ───────────────────────────────────────────

#[test]
fn hot_water_over_limit_is_reported_once_per_stay() {
    let mut rig = Rig::new(HeaterConfig {
        hotwater_min: 1,
        ..Default::default()
    });
    rig.lines.logical = StateBits::HOTWATER_LED;

    for t in (0..=3 * MINUTE).step_by(1_000) {
        rig.step(t);
        let expected = usize::from(t > MINUTE);
        assert_eq!(rig.sink.count(&AppEvent::HotWaterTimeout), expected, "at {}", t);
    }
    assert!(rig.sink.reports().iter().any(|r| r.ends_with("]h*")));

    // leaving and re-entering starts a new stay
    rig.lines.logical = StateBits::WORKING_LED;
    rig.step(3 * MINUTE + 1_000);
    rig.lines.logical = StateBits::HOTWATER_LED;
    for t in (3 * MINUTE + 2_000..=5 * MINUTE).step_by(1_000) {
        rig.step(t);
    }
    assert_eq!(rig.sink.count(&AppEvent::HotWaterTimeout), 2);
}

#[test]
fn hot_water_limit_zero_disables() {
    let mut rig = Rig::new(HeaterConfig::default());
    rig.lines.logical = StateBits::HOTWATER_LED;
    for t in (0..=5 * MINUTE).step_by(1_000) {
        rig.step(t);
    }
    assert_eq!(rig.sink.count(&AppEvent::HotWaterTimeout), 0);
}

// ── Activity statistics ───────────────────────────────────────

#[test]
fn stats_dump_reports_phases_and_history() {
    fn at(rig: &mut Rig, t: u32, centi: i16) {
        rig.ctl.zones().set_value(0, Temp::from_centi(centi), t);
        rig.step(t);
    }

    let mut rig = Rig::new(HeaterConfig::default());

    for t in (0..=10 * MINUTE).step_by(1_000) {
        at(&mut rig, t, 2_000);
    }
    rig.lines.logical = StateBits::WORKING_LED | StateBits::ACTIVE_LED;
    for t in (10 * MINUTE + 1_000..15 * MINUTE + 1_000).step_by(1_000) {
        at(&mut rig, t, 2_000);
    }
    at(&mut rig, 15 * MINUTE + 1_000, 2_120);

    rig.command("!CS", 15 * MINUTE + 2_000);
    // 40 idle samples then 20 working ones
    assert_eq!(rig.last_report(), "[CS w20 d+0.00 i10+0.00 a5+1.20]*");
    assert_eq!(rig.ctl.history().len(), 60);
}
