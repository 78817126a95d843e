//! Mock hardware and port adapters for integration tests.
//!
//! Records every port call so tests can assert on the override line, the
//! serial link and persisted config without touching real GPIO or NVS.

use std::cell::Cell;
use std::collections::VecDeque;
use std::rc::Rc;

use heatguard::acquisition::Mode;
use heatguard::app::events::AppEvent;
use heatguard::app::ports::{
    ConfigError, ConfigPort, EventSink, HeaterSignals, IndicatorLines, OverrideLine, SenseInput,
    SerialPort, ZoneReadings,
};
use heatguard::config::HeaterConfig;
use heatguard::sensors::N_ZONES;
use heatguard::sensors::temperature::Temp;

// ── Indicator lines ───────────────────────────────────────────

/// Indicator lines addressed by logical bits; `sample` returns the
/// active-low electrical levels.
#[derive(Debug, Default)]
pub struct MockLines {
    pub logical: u8,
}

impl MockLines {
    pub fn lit(logical: u8) -> Self {
        Self { logical }
    }
}

impl IndicatorLines for MockLines {
    fn sample(&mut self) -> u8 {
        !self.logical & 0x3F
    }
}

// ── Override line / sense ─────────────────────────────────────

/// Override output; the level is shared so tests can watch it after the
/// line has moved into the monitor.
#[derive(Debug, Clone, Default)]
pub struct MockOverride {
    pub high: Rc<Cell<bool>>,
    pub drives: Rc<Cell<u32>>,
}

impl OverrideLine for MockOverride {
    fn drive_high(&mut self) {
        self.high.set(true);
        self.drives.set(self.drives.get() + 1);
    }

    fn release(&mut self) {
        self.high.set(false);
    }
}

#[derive(Debug, Clone, Default)]
pub struct MockSense {
    pub raw: Rc<Cell<u16>>,
    pub reads: Rc<Cell<u32>>,
}

impl SenseInput for MockSense {
    fn read_raw(&mut self) -> u16 {
        self.reads.set(self.reads.get() + 1);
        self.raw.get()
    }
}

// ── Engine-facing mocks ───────────────────────────────────────

/// What the forcing engine sees of the heater, settable directly.
#[derive(Debug)]
pub struct MockSignals {
    pub active: u8,
    pub mode: Mode,
    pub forced: bool,
}

impl MockSignals {
    pub fn new(mode: Mode) -> Self {
        Self {
            active: 0,
            mode,
            forced: false,
        }
    }
}

impl HeaterSignals for MockSignals {
    fn active_bits(&mut self) -> u8 {
        self.active
    }

    fn mode(&self) -> Mode {
        self.mode
    }

    fn set_force_on(&mut self, on: bool) {
        self.forced = on;
    }
}

/// Fixed zone readings; every zone starts invalid.
#[derive(Debug)]
pub struct MockZones(pub [Temp; N_ZONES]);

impl MockZones {
    pub fn new() -> Self {
        Self([Temp::INVALID; N_ZONES])
    }

    pub fn with(mut self, zone: usize, centi: i16) -> Self {
        self.0[zone] = Temp::from_centi(centi);
        self
    }
}

impl ZoneReadings for MockZones {
    fn reading(&mut self, zone: usize, _now_ms: u32) -> Temp {
        self.0[zone]
    }
}

// ── Serial link ───────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct MockSerial {
    pub rx: VecDeque<u8>,
    pub tx: Vec<String>,
}

#[allow(dead_code)]
impl MockSerial {
    pub fn send(&mut self, s: &str) {
        self.rx.extend(s.bytes());
    }
}

impl SerialPort for MockSerial {
    fn read_byte(&mut self) -> Option<u8> {
        self.rx.pop_front()
    }

    fn write_line(&mut self, line: &str) {
        self.tx.push(line.to_owned());
    }
}

// ── Config store ──────────────────────────────────────────────

/// In-memory config store that keeps every save.
#[derive(Debug, Default)]
pub struct MockStore {
    pub saves: Vec<HeaterConfig>,
    pub fail: bool,
}

impl ConfigPort for MockStore {
    fn load(&self) -> Result<HeaterConfig, ConfigError> {
        Ok(self.saves.last().cloned().unwrap_or_default())
    }

    fn save(&mut self, config: &HeaterConfig) -> Result<(), ConfigError> {
        config.validate()?;
        if self.fail {
            return Err(ConfigError::IoError);
        }
        self.saves.push(config.clone());
        Ok(())
    }
}

// ── Event sink ────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    /// Report lines in emission order.
    pub fn reports(&self) -> Vec<String> {
        self.events
            .iter()
            .filter_map(|e| match e {
                AppEvent::Report(line) => Some(line.as_str().to_owned()),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, event: &AppEvent) -> usize {
        self.events.iter().filter(|e| *e == event).count()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}
