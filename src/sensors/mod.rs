//! Zone temperatures: the store behind the [`ZoneReadings`] port.
//!
//! Each zone keeps an [`ExpiringPair`]: the local probe writes through
//! [`TempZones::set_value`], readings arriving over the serial link go
//! through [`TempZones::set_received`] and are fused max-of-last-two.
//! A zone that has not been refreshed within [`ZONE_STALE_MS`] reads as
//! invalid and never triggers forcing.

pub mod temperature;

use log::debug;

use crate::app::ports::ZoneReadings;
use crate::timing::{ExpiringPair, MINUTE};
use temperature::Temp;

/// Number of independently configured zones.
pub const N_ZONES: usize = 10;

/// Zone readings go stale after this long without a refresh.
pub const ZONE_STALE_MS: u32 = 3 * MINUTE;

type ZoneValue = ExpiringPair<Temp, ZONE_STALE_MS>;

pub struct TempZones {
    zones: [ZoneValue; N_ZONES],
}

impl Default for TempZones {
    fn default() -> Self {
        Self::new()
    }
}

impl TempZones {
    pub fn new() -> Self {
        Self {
            zones: [ZoneValue::new(); N_ZONES],
        }
    }

    /// Local measurement for `zone`.  Out-of-range zones are ignored.
    pub fn set_value(&mut self, zone: usize, temp: Temp, now_ms: u32) {
        if let Some(z) = self.zones.get_mut(zone) {
            z.set_value(temp, now_ms);
        }
    }

    /// Remote reading for `zone`, fused with the previous one.
    pub fn set_received(&mut self, zone: usize, temp: Temp, now_ms: u32) {
        if let Some(z) = self.zones.get_mut(zone) {
            debug!("zone {}: received {}", zone, temp);
            z.set_received(temp, now_ms);
        }
    }

    pub fn get(&mut self, zone: usize, now_ms: u32) -> Temp {
        self.zones
            .get_mut(zone)
            .map_or(Temp::INVALID, |z| z.get(now_ms))
    }
}

impl ZoneReadings for TempZones {
    fn reading(&mut self, zone: usize, now_ms: u32) -> Temp {
        self.get(zone, now_ms)
    }
}
