//! GPIO / peripheral pin assignments for the heater supervisor board.
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.  Change a pin here and it propagates everywhere.

// ---------------------------------------------------------------------------
// Heater indicator lines (all active-low, optocoupled)
// ---------------------------------------------------------------------------

/// Indicator inputs in bit order: line `i` lands in bit `i` of the sample.
///
/// | bit | indicator |
/// |-----|-----------|
/// | 0   | working   |
/// | 1   | timer     |
/// | 2   | off       |
/// | 3   | hot water |
/// | 4   | error     |
/// | 5   | active    |
pub const INDICATOR_GPIOS: [i32; 6] = [4, 5, 6, 7, 15, 16];

// ---------------------------------------------------------------------------
// Override output
// ---------------------------------------------------------------------------

/// Driven high to hold the heater on; otherwise a floating input.
pub const OVERRIDE_GPIO: i32 = 17;

// ---------------------------------------------------------------------------
// "Turned on" sense (ADC1)
// ---------------------------------------------------------------------------

/// Analog sense of the heater's own "on" line.
/// ADC1 channel 0 (GPIO 1 on ESP32-S3).
pub const SENSE_ADC_GPIO: i32 = 1;
pub const SENSE_ADC_CHANNEL: u32 = 0;

// ---------------------------------------------------------------------------
// Status LED
// ---------------------------------------------------------------------------

/// Discrete status LED, active high.  `main` takes it as `gpio2`.
pub const STATUS_LED_GPIO: i32 = 2;

// ---------------------------------------------------------------------------
// Serial link
// ---------------------------------------------------------------------------

pub const SERIAL_UART: i32 = 1;
pub const SERIAL_TX_GPIO: i32 = 43;
pub const SERIAL_RX_GPIO: i32 = 44;
pub const SERIAL_BAUD: i32 = 9_600;
