//! Forcing engine scenarios against mock heater signals and zone readings.

use heatguard::acquisition::Mode;
use heatguard::config::{ForceMode, HeaterConfig};
use heatguard::control::ForceEngine;
use heatguard::sensors::temperature::Temp;
use heatguard::timing::MINUTE;

use super::mock_hw::{MockSignals, MockZones};

fn auto_config() -> HeaterConfig {
    HeaterConfig {
        force: ForceMode::Auto,
        ..Default::default()
    }
}

/// Period 30 min, duration 5 min, zone 3 has only a P threshold.
fn periodic_config() -> HeaterConfig {
    let mut cfg = HeaterConfig {
        force: ForceMode::Auto,
        period_min: 30,
        duration_min: 5,
        ..Default::default()
    };
    cfg.zones[3].periodic = Temp::from_centi(1_000);
    cfg
}

/// Drive the engine into a periodic forced cycle and let the heater
/// respond.  Returns the time the heater became active.
fn enter_periodic_cycle(
    engine: &mut ForceEngine,
    signals: &mut MockSignals,
    cfg: &HeaterConfig,
    zones: &mut MockZones,
) -> u32 {
    assert!(!engine.check(0, signals, cfg, zones));
    assert!(!signals.forced);

    let t = 30 * MINUTE;
    assert!(!engine.check(t, signals, cfg, zones));
    assert!(signals.forced, "periodic forcing after 30 min inactive");

    let on = t + 1_000;
    signals.active = 0b10;
    assert!(!engine.check(on, signals, cfg, zones));
    assert!(signals.forced);
    on
}

// ── Explicit force modes ──────────────────────────────────────

#[test]
fn force_on_always_asserts_and_returns_false() {
    let mut engine = ForceEngine::new();
    let cfg = HeaterConfig {
        force: ForceMode::On,
        ..Default::default()
    };
    let mut zones = MockZones::new().with(0, -500);
    for (i, mode) in [Mode::Working, Mode::Off, Mode::Unknown].into_iter().enumerate() {
        let mut signals = MockSignals::new(mode);
        signals.active = i as u8 % 2;
        assert!(!engine.check(i as u32 * 1_000, &mut signals, &cfg, &mut zones));
        assert!(signals.forced);
    }
    assert_eq!(engine.forced_zone(), None);
}

#[test]
fn force_on_stays_asserted_past_duration() {
    let mut engine = ForceEngine::new();
    let cfg = HeaterConfig {
        force: ForceMode::On,
        duration_min: 1,
        ..Default::default()
    };
    let mut signals = MockSignals::new(Mode::Working);
    let mut zones = MockZones::new();
    engine.check(0, &mut signals, &cfg, &mut zones);
    signals.active = 1;
    for t in (0..10).map(|m| m * MINUTE) {
        engine.check(t, &mut signals, &cfg, &mut zones);
        assert!(signals.forced);
    }
}

// ── Temperature forcing ───────────────────────────────────────

#[test]
fn auto_working_forces_on_first_cold_zone() {
    let mut engine = ForceEngine::new();
    let mut cfg = auto_config();
    cfg.zones[5].active = Temp::from_centi(2_000);
    // zone 2 is far colder but has no A threshold
    cfg.zones[2].inactive = Temp::from_centi(2_500);
    let mut zones = MockZones::new().with(2, -1_000).with(5, 1_850);
    let mut signals = MockSignals::new(Mode::Working);

    assert!(engine.check(1_000, &mut signals, &cfg, &mut zones));
    assert!(signals.forced);
    assert_eq!(engine.forced_zone(), Some(5));
}

#[test]
fn timer_mode_uses_active_threshold_too() {
    let mut engine = ForceEngine::new();
    let mut cfg = auto_config();
    cfg.zones[0].active = Temp::from_centi(2_000);
    let mut zones = MockZones::new().with(0, 1_999);
    let mut signals = MockSignals::new(Mode::Timer);

    assert!(engine.check(0, &mut signals, &cfg, &mut zones));
    assert_eq!(engine.forced_zone(), Some(0));
}

#[test]
fn reading_at_threshold_does_not_force() {
    let mut engine = ForceEngine::new();
    let mut cfg = auto_config();
    cfg.zones[1].active = Temp::from_centi(2_000);
    let mut zones = MockZones::new().with(1, 2_000);
    let mut signals = MockSignals::new(Mode::Working);

    assert!(!engine.check(0, &mut signals, &cfg, &mut zones));
    assert!(!signals.forced);
    assert_eq!(engine.forced_zone(), None);
}

#[test]
fn unknown_mode_never_forces_on_temperature() {
    let mut engine = ForceEngine::new();
    let mut cfg = auto_config();
    cfg.zones[0].active = Temp::from_centi(2_000);
    cfg.zones[0].inactive = Temp::from_centi(2_000);
    let mut zones = MockZones::new().with(0, 0);
    let mut signals = MockSignals::new(Mode::Unknown);

    assert!(!engine.check(0, &mut signals, &cfg, &mut zones));
    assert!(!signals.forced);
}

#[test]
fn active_heater_is_not_forced_by_temperature() {
    let mut engine = ForceEngine::new();
    let mut cfg = auto_config();
    cfg.zones[0].active = Temp::from_centi(2_000);
    let mut zones = MockZones::new().with(0, 1_000);
    let mut signals = MockSignals::new(Mode::Working);
    signals.active = 1;

    assert!(!engine.check(0, &mut signals, &cfg, &mut zones));
    assert!(!signals.forced);
}

// ── Periodic forcing ──────────────────────────────────────────

#[test]
fn periodic_forcing_after_inactive_period() {
    let mut engine = ForceEngine::new();
    let cfg = periodic_config();
    let mut zones = MockZones::new().with(3, 800);
    let mut signals = MockSignals::new(Mode::Off);

    assert!(!engine.check(0, &mut signals, &cfg, &mut zones));
    assert!(!engine.check(30 * MINUTE - 1, &mut signals, &cfg, &mut zones));
    assert!(!signals.forced);

    assert!(!engine.check(30 * MINUTE, &mut signals, &cfg, &mut zones));
    assert!(signals.forced);
    assert_eq!(engine.forced_zone(), None);
}

#[test]
fn periodic_forcing_needs_a_cold_zone() {
    let mut engine = ForceEngine::new();
    let cfg = periodic_config();
    let mut zones = MockZones::new().with(3, 1_000);
    let mut signals = MockSignals::new(Mode::Off);

    engine.check(0, &mut signals, &cfg, &mut zones);
    engine.check(45 * MINUTE, &mut signals, &cfg, &mut zones);
    assert!(!signals.forced);
}

#[test]
fn periodic_forcing_disabled_by_zero_duration() {
    let mut engine = ForceEngine::new();
    let cfg = HeaterConfig {
        duration_min: 0,
        ..periodic_config()
    };
    let mut zones = MockZones::new().with(3, 0);
    let mut signals = MockSignals::new(Mode::Off);

    engine.check(0, &mut signals, &cfg, &mut zones);
    engine.check(60 * MINUTE, &mut signals, &cfg, &mut zones);
    assert!(!signals.forced);
}

// ── Duration and cancellation ─────────────────────────────────

#[test]
fn forced_cycle_released_after_duration() {
    let mut engine = ForceEngine::new();
    let cfg = periodic_config();
    let mut zones = MockZones::new().with(3, 800);
    let mut signals = MockSignals::new(Mode::Working);

    let on = enter_periodic_cycle(&mut engine, &mut signals, &cfg, &mut zones);

    engine.check(on + 5 * MINUTE - 1, &mut signals, &cfg, &mut zones);
    assert!(signals.forced, "still inside the duration");

    engine.check(on + 5 * MINUTE, &mut signals, &cfg, &mut zones);
    assert!(!signals.forced, "released after exactly the duration");
    assert!(!engine.is_canceled());
}

#[test]
fn mode_change_cancels_and_stays_cancelled() {
    let mut engine = ForceEngine::new();
    let cfg = periodic_config();
    let mut zones = MockZones::new().with(3, 800);
    let mut signals = MockSignals::new(Mode::Working);

    let on = enter_periodic_cycle(&mut engine, &mut signals, &cfg, &mut zones);

    signals.mode = Mode::Timer;
    engine.check(on + MINUTE, &mut signals, &cfg, &mut zones);
    assert!(!signals.forced, "mode change releases at once");
    assert!(engine.is_canceled());

    signals.mode = Mode::Working;
    engine.check(on + 2 * MINUTE, &mut signals, &cfg, &mut zones);
    assert!(!signals.forced, "reverting the mode does not resume");

    // the cycle ends when the heater goes quiet
    signals.active = 0;
    engine.check(on + 3 * MINUTE, &mut signals, &cfg, &mut zones);
    assert!(!engine.is_canceled());
}

#[test]
fn force_off_mid_cycle_releases_for_rest_of_cycle() {
    let mut engine = ForceEngine::new();
    let mut cfg = periodic_config();
    let mut zones = MockZones::new().with(3, 800);
    let mut signals = MockSignals::new(Mode::Working);

    let on = enter_periodic_cycle(&mut engine, &mut signals, &cfg, &mut zones);

    cfg.force = ForceMode::Off;
    engine.check(on + MINUTE, &mut signals, &cfg, &mut zones);
    assert!(!signals.forced);

    // back to Auto while the heater still runs: no new trigger while active
    cfg.force = ForceMode::Auto;
    engine.check(on + 2 * MINUTE, &mut signals, &cfg, &mut zones);
    assert!(!signals.forced);
}

#[test]
fn temperature_zone_tracks_current_readings() {
    let mut engine = ForceEngine::new();
    let mut cfg = auto_config();
    cfg.duration_min = 5;
    cfg.zones[7].active = Temp::from_centi(2_000);
    let mut zones = MockZones::new().with(7, 1_500);
    let mut signals = MockSignals::new(Mode::Working);

    assert!(engine.check(0, &mut signals, &cfg, &mut zones));
    signals.active = 0b10;
    assert!(!engine.check(1_000, &mut signals, &cfg, &mut zones));
    assert!(signals.forced);
    assert_eq!(engine.forced_zone(), Some(7));

    // zone warms up while the forced cycle is still running
    zones = zones.with(7, 2_100);
    assert!(!engine.check(2_000, &mut signals, &cfg, &mut zones));
    assert!(signals.forced);
    assert_eq!(engine.forced_zone(), None);
}
