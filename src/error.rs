//! Unified error types for the heater supervisor firmware.
//!
//! A single `Error` enum that every outer subsystem converts into.  All
//! variants are `Copy`.  The acquisition and forcing core never returns
//! errors; conditions there are carried by sentinels and flags.

use core::fmt;

use crate::app::commands::CommandError;
use crate::app::ports::{ConfigError, StorageError};

/// Every fallible outer-layer operation funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Configuration is invalid or could not be loaded / stored.
    Config(ConfigError),
    /// Key/value storage failed.
    Storage(StorageError),
    /// A serial command was rejected.
    Command(CommandError),
    /// Peripheral initialisation failed.
    Init(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Storage(e) => write!(f, "storage: {e}"),
            Self::Command(e) => write!(f, "command: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<StorageError> for Error {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

impl From<CommandError> for Error {
    fn from(e: CommandError) -> Self {
        Self::Command(e)
    }
}

impl std::error::Error for Error {}

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
