//! HeatGuard firmware entry point.
//!
//! Hexagonal architecture around a single cooperative main loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  EspIndicatorLines  EspOverrideLine  EspSenseInput  UartSerial │
//! │  (GPIO ISR)         (override GPIO)  (ADC1)         (UART1)    │
//! │  SerialEventSink    NvsAdapter       Esp32TimeAdapter          │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              Controller (pure logic)                   │    │
//! │  │  StateMonitor · ForceEngine · TempZones · Commands     │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  SignalLatch (shared with the indicator ISR) · StatusLed       │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use log::{info, warn};

use esp_idf_svc::hal::delay::FreeRtos;
use esp_idf_svc::hal::gpio::PinDriver;
use esp_idf_svc::hal::peripherals::Peripherals;

use heatguard::acquisition::StateMonitor;
use heatguard::acquisition::latch::SignalLatch;
use heatguard::adapters::hardware::{EspOverrideLine, EspSenseInput};
use heatguard::adapters::log_sink::SerialEventSink;
use heatguard::adapters::nvs::NvsAdapter;
use heatguard::adapters::serial::UartSerial;
use heatguard::adapters::time::Esp32TimeAdapter;
use heatguard::app::ports::ConfigPort;
use heatguard::app::service::Controller;
use heatguard::config::HeaterConfig;
use heatguard::drivers::hw_init;
use heatguard::drivers::status_led::StatusLed;
use heatguard::error::Error;

/// Indicator state shared between the GPIO ISR and the main loop.
static SIGNALS: SignalLatch = SignalLatch::new();

/// Main-loop pass period.
const LOOP_DELAY_MS: u32 = 10;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  HeatGuard v{}                       ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let peripherals = Peripherals::take()?;

    // ── 2. Initialise hardware peripherals ────────────────────
    hw_init::init_peripherals().map_err(Error::from)?;
    hw_init::init_isr_service(&SIGNALS).map_err(Error::from)?;

    // ── 3. Load config from NVS (or defaults) ─────────────────
    let mut nvs = NvsAdapter::new().map_err(Error::from)?;
    let config = match nvs.load() {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!("NVS config load failed ({}), using defaults", e);
            HeaterConfig::default()
        }
    };

    // ── 4. Construct adapters and controller ──────────────────
    let clock = Esp32TimeAdapter::new();
    let monitor = StateMonitor::new(&SIGNALS, EspOverrideLine, EspSenseInput);
    let mut controller = Controller::new(monitor, config);

    let mut serial = UartSerial;
    let mut sink = SerialEventSink::new(UartSerial);
    let mut led = StatusLed::new(PinDriver::output(peripherals.pins.gpio2)?);

    controller.start(clock.now_ms(), &mut sink);
    info!("System ready. Entering main loop.");

    // ── 5. Main loop ──────────────────────────────────────────
    loop {
        let now = clock.now_ms();
        controller.tick(now, &mut serial, &mut nvs, &mut sink);
        led.tick(now, controller.is_force_on());
        FreeRtos::delay_ms(LOOP_DELAY_MS);
    }
}
