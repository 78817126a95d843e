//! HeatGuard heater supervisor firmware library.
//!
//! Exposes the pure-logic modules for integration testing and host-side
//! simulation. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod acquisition;
pub mod app;
pub mod config;
pub mod control;
pub mod error;
pub mod sensors;
pub mod timing;

pub mod pins;

// Adapters and drivers carry a host simulation backend behind cfg
// attributes, so the whole crate builds and tests off-target.
pub mod adapters;
pub mod drivers;
