//! Fuzz target: serial `CommandParser`
//!
//! Feeds arbitrary bytes from the link and checks that:
//! - the parser never panics
//! - every emitted config edit either validates or is rejected, never
//!   leaving an out-of-range value in an accepted config
//!
//! cargo fuzz run fuzz_command_parser

#![no_main]

use heatguard::app::commands::{Command, CommandParser};
use heatguard::config::HeaterConfig;
use heatguard::sensors::N_ZONES;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut parser = CommandParser::new();
    let mut config = HeaterConfig::default();

    for &b in data {
        let Some(cmd) = parser.feed(b) else {
            continue;
        };
        let mut next = config.clone();
        match cmd {
            Command::SetForce(mode) => next.force = mode,
            Command::SetPeriod(min) => next.period_min = min,
            Command::SetDuration(min) => next.duration_min = min,
            Command::SetHotWater(min) => next.hotwater_min = min,
            Command::SetThreshold { zone, kind, temp } => {
                if usize::from(zone) >= N_ZONES {
                    continue;
                }
                next.zones[usize::from(zone)].set(kind, temp);
            }
            _ => continue,
        }
        if next.validate().is_ok() {
            config = next;
        }
    }

    assert!(config.validate().is_ok(), "accepted config failed validation");
});
