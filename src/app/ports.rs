//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ StateMonitor / ForceEngine / Controller
//! ```
//!
//! Driven adapters (indicator pins, override line, sense ADC, storage,
//! serial link, event sinks) implement these traits.  The domain consumes
//! them via generics, so the core never touches hardware directly and the
//! whole control path runs on the host against mocks.
//!
//! ## Notes
//!
//! - **IndicatorLines** is called from interrupt context: implementations
//!   must only read GPIO levels.
//! - **ConfigPort** implementations MUST validate before persisting.

use crate::acquisition::Mode;
use crate::config::HeaterConfig;
use crate::sensors::temperature::Temp;

// ───────────────────────────────────────────────────────────────
// Heater-side hardware (driven adapters: hardware ↔ acquisition)
// ───────────────────────────────────────────────────────────────

/// Raw levels of the six indicator lines, bit `i` = line `i`.
///
/// The lines are active-low; inversion happens in the latch, not here.
pub trait IndicatorLines {
    fn sample(&mut self) -> u8;
}

/// The override ("force") output.
pub trait OverrideLine {
    /// Configure as output and drive high.
    fn drive_high(&mut self);

    /// Return to a floating input with no pull, leaving the heater alone.
    fn release(&mut self);
}

/// 12-bit analog reading of the "turned on" sense line.
pub trait SenseInput {
    fn read_raw(&mut self) -> u16;
}

// ───────────────────────────────────────────────────────────────
// Engine-facing views
// ───────────────────────────────────────────────────────────────

/// Per-zone temperatures as seen by the forcing engine.
pub trait ZoneReadings {
    /// Current reading for `zone`; invalid when unknown or stale.
    fn reading(&mut self, zone: usize, now_ms: u32) -> Temp;
}

/// What the forcing engine needs from state acquisition.
pub trait HeaterSignals {
    /// `active_led | turned_on << 1`; non-zero means the heater is active.
    fn active_bits(&mut self) -> u8;

    fn mode(&self) -> Mode;

    fn set_force_on(&mut self, on: bool);
}

// ───────────────────────────────────────────────────────────────
// Serial link (driven adapter: domain ↔ UART)
// ───────────────────────────────────────────────────────────────

/// Byte-in, line-out serial link.
pub trait SerialPort {
    /// Next pending byte, without blocking.
    fn read_byte(&mut self) -> Option<u8>;

    /// Write `line` followed by a line terminator.
    fn write_line(&mut self, line: &str);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / serial)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists the heater configuration.
///
/// Implementations MUST validate config values before persisting.
/// Out-of-range values are rejected with [`ConfigError::ValidationFailed`],
/// never silently clamped.
pub trait ConfigPort {
    /// Load configuration from persistent storage.
    /// Returns [`HeaterConfig::default()`] if no stored config exists.
    fn load(&self) -> Result<HeaterConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&mut self, config: &HeaterConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Storage port (driven adapter: domain ↔ NVS / flash)
// ───────────────────────────────────────────────────────────────

/// Persistent key-value byte storage.
///
/// Keys are namespaced to prevent collisions between subsystems.  Writes
/// MUST be atomic: no partial blobs on power loss.  ESP-IDF NVS guarantees
/// this natively; the in-memory simulation achieves it trivially.
pub trait StoragePort {
    /// Read a value.  Returns the number of bytes written to `buf`.
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError>;

    /// Write a value atomically.
    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError>;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// No config found in storage (first boot).
    NotFound,
    /// Stored config failed deserialization.
    Corrupted,
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Underlying storage is full.
    StorageFull,
    /// Generic I/O error from the storage backend.
    IoError,
}

/// Errors from [`StoragePort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Requested key does not exist.
    NotFound,
    /// Storage partition is full.
    Full,
    /// Caller's buffer is smaller than the stored value.
    BufferTooSmall,
    /// Generic I/O error.
    IoError,
}

impl From<StorageError> for ConfigError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::NotFound => Self::NotFound,
            StorageError::Full => Self::StorageFull,
            StorageError::BufferTooSmall => Self::Corrupted,
            StorageError::IoError => Self::IoError,
        }
    }
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::StorageFull => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "key not found"),
            Self::Full => write!(f, "storage full"),
            Self::BufferTooSmall => write!(f, "buffer too small"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}
