//! Hardware adapter: bridges the heater's lines to the acquisition ports.
//!
//! This is the only module besides `drivers::hw_init` that touches the
//! heater side of the board.  On non-espidf targets the underlying helpers
//! are simulation cells, so the same adapters run in host tests.

use crate::app::ports::{IndicatorLines, OverrideLine, SenseInput};
use crate::drivers::hw_init;

/// The six indicator inputs.  Safe to sample from the GPIO ISR.
#[derive(Debug, Clone, Copy, Default)]
pub struct EspIndicatorLines;

impl IndicatorLines for EspIndicatorLines {
    fn sample(&mut self) -> u8 {
        hw_init::indicator_levels()
    }
}

/// Override output: push-pull high when forcing, floating input otherwise.
#[derive(Debug, Default)]
pub struct EspOverrideLine;

impl OverrideLine for EspOverrideLine {
    fn drive_high(&mut self) {
        hw_init::override_drive_high();
    }

    fn release(&mut self) {
        hw_init::override_release();
    }
}

/// ADC1 reading of the heater's "turned on" line.
#[derive(Debug, Default)]
pub struct EspSenseInput;

impl SenseInput for EspSenseInput {
    fn read_raw(&mut self) -> u16 {
        hw_init::sense_read()
    }
}
