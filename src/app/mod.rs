//! Application core: supervision logic, zero direct I/O.
//!
//! The controller ties state acquisition, the forcing engine, the serial
//! command set and the report lines together.  All interaction with
//! hardware happens through **port traits** defined in [`ports`], keeping
//! this layer fully testable without real peripherals.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
pub mod status;
