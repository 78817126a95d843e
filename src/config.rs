//! Heater supervisor configuration
//!
//! Everything the forcing policy can be tuned with.  Held in RAM by the
//! controller, persisted as a postcard blob through the
//! [`ConfigPort`](crate::app::ports::ConfigPort), edited over the serial link.

use serde::{Deserialize, Serialize};

use crate::acquisition::Mode;
use crate::app::ports::ConfigError;
use crate::sensors::temperature::Temp;
use crate::sensors::N_ZONES;
use crate::timing::MINUTE;

/// Encoded config never exceeds this many bytes.
pub const CONFIG_BLOB_SIZE: usize = 128;

/// Longest accepted period / duration / hot-water limit.
pub const MAX_PERIOD_MIN: u8 = 240;

/// Accepted threshold range, in hundredths of a degree.
pub const MIN_THRESHOLD: Temp = Temp::from_centi(-5_000);
pub const MAX_THRESHOLD: Temp = Temp::from_centi(10_000);

/// Override policy.  Stored as a byte; anything unrecognised means `Off`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
#[repr(u8)]
pub enum ForceMode {
    #[default]
    Off = 0,
    On = 1,
    Auto = 2,
}

impl ForceMode {
    pub const fn from_u8(v: u8) -> Self {
        match v {
            1 => Self::On,
            2 => Self::Auto,
            _ => Self::Off,
        }
    }
}

impl From<u8> for ForceMode {
    fn from(v: u8) -> Self {
        Self::from_u8(v)
    }
}

impl From<ForceMode> for u8 {
    fn from(m: ForceMode) -> Self {
        m as u8
    }
}

/// Which of a zone's three thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdKind {
    /// `A`: while the heater should be running.
    Active,
    /// `B`: while the heater should be idle.
    Inactive,
    /// `P`: precondition for periodic forcing.
    Periodic,
}

impl ThresholdKind {
    pub const fn from_letter(c: u8) -> Option<Self> {
        match c {
            b'A' | b'a' => Some(Self::Active),
            b'B' | b'b' => Some(Self::Inactive),
            b'P' | b'p' => Some(Self::Periodic),
            _ => None,
        }
    }

    pub const fn letter(self) -> char {
        match self {
            Self::Active => 'A',
            Self::Inactive => 'B',
            Self::Periodic => 'P',
        }
    }
}

/// Per-zone thresholds.  Invalid means "not set".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ZoneThresholds {
    pub active: Temp,
    pub inactive: Temp,
    pub periodic: Temp,
}

impl ZoneThresholds {
    pub const UNSET: Self = Self {
        active: Temp::INVALID,
        inactive: Temp::INVALID,
        periodic: Temp::INVALID,
    };

    pub const fn get(&self, kind: ThresholdKind) -> Temp {
        match kind {
            ThresholdKind::Active => self.active,
            ThresholdKind::Inactive => self.inactive,
            ThresholdKind::Periodic => self.periodic,
        }
    }

    pub fn set(&mut self, kind: ThresholdKind, t: Temp) {
        match kind {
            ThresholdKind::Active => self.active = t,
            ThresholdKind::Inactive => self.inactive = t,
            ThresholdKind::Periodic => self.periodic = t,
        }
    }

    /// Temperature-trigger threshold for `mode`: A while working or on the
    /// timer, B while off, none otherwise.
    pub const fn for_mode(&self, mode: Mode) -> Temp {
        match mode {
            Mode::Working | Mode::Timer => self.active,
            Mode::Off => self.inactive,
            Mode::Unknown | Mode::HotWater => Temp::INVALID,
        }
    }

    pub fn any_set(&self) -> bool {
        self.active.valid() || self.inactive.valid() || self.periodic.valid()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaterConfig {
    /// Last mode the heater was seen in while supervised.
    pub saved_mode: Mode,
    pub force: ForceMode,
    /// Inactivity needed before periodic forcing.  0 disables it.
    pub period_min: u8,
    /// How long a forced cycle may run.  0 disables periodic forcing.
    pub duration_min: u8,
    /// Hot-water limit.  Reported only.
    pub hotwater_min: u8,
    pub zones: [ZoneThresholds; N_ZONES],
}

impl Default for HeaterConfig {
    fn default() -> Self {
        Self {
            saved_mode: Mode::Unknown,
            force: ForceMode::Off,
            period_min: 0,
            duration_min: 0,
            hotwater_min: 0,
            zones: [ZoneThresholds::UNSET; N_ZONES],
        }
    }
}

impl HeaterConfig {
    pub fn period_ms(&self) -> u32 {
        u32::from(self.period_min) * MINUTE
    }

    pub fn duration_ms(&self) -> u32 {
        u32::from(self.duration_min) * MINUTE
    }

    /// Longest hot-water stay before it is reported; 0 disables.
    pub fn hotwater_ms(&self) -> u32 {
        u32::from(self.hotwater_min) * MINUTE
    }

    /// Range-check every field.  Never clamps.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.period_min > MAX_PERIOD_MIN {
            return Err(ConfigError::ValidationFailed("period must be 0–240 min"));
        }
        if self.duration_min > MAX_PERIOD_MIN {
            return Err(ConfigError::ValidationFailed("duration must be 0–240 min"));
        }
        if self.hotwater_min > MAX_PERIOD_MIN {
            return Err(ConfigError::ValidationFailed("hot-water limit must be 0–240 min"));
        }
        for z in &self.zones {
            for t in [z.active, z.inactive, z.periodic] {
                if t.valid() && !(MIN_THRESHOLD..=MAX_THRESHOLD).contains(&t) {
                    return Err(ConfigError::ValidationFailed(
                        "thresholds must be -50.00–+100.00 °C",
                    ));
                }
            }
        }
        Ok(())
    }

    /// Serialize into `buf`, returning the used prefix.
    pub fn encode<'b>(&self, buf: &'b mut [u8]) -> Result<&'b [u8], ConfigError> {
        postcard::to_slice(self, buf)
            .map(|used| &*used)
            .map_err(|_| ConfigError::IoError)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, ConfigError> {
        postcard::from_bytes(bytes).map_err(|_| ConfigError::Corrupted)
    }
}
