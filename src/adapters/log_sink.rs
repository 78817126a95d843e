//! Event sink adapters.
//!
//! [`LogEventSink`] writes every [`AppEvent`] to the ESP-IDF logger.
//! [`SerialEventSink`] sends report lines and reset requests out on the
//! serial link and logs everything else.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::{EventSink, SerialPort};

/// Adapter that logs every [`AppEvent`] to the console.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started => info!("START"),
            AppEvent::ModeChanged { from, to } => info!("MODE  | {} -> {}", from, to),
            AppEvent::PowerLost => warn!("POWER | lost"),
            AppEvent::PowerBack => info!("POWER | back"),
            AppEvent::ErrorRaised => warn!("ERROR | raised"),
            AppEvent::ErrorCleared => info!("ERROR | cleared"),
            AppEvent::ForcedOn { zone: Some(z) } => info!("FORCE | on, zone {}", z),
            AppEvent::ForcedOn { zone: None } => info!("FORCE | on"),
            AppEvent::ForceReleased => info!("FORCE | released"),
            AppEvent::ConfigChanged => info!("CONFIG| changed"),
            AppEvent::HotWaterTimeout => warn!("HOTWTR| over limit"),
            AppEvent::ResetRequest => warn!("RESET | requested"),
            AppEvent::Report(line) => info!("REPORT| {}", line),
        }
    }
}

/// Line the host watches for before power-cycling the heater.
pub const RESET_REQUEST_LINE: &str = "!RR";

/// Report lines and reset requests to the serial link, the rest to the log.
pub struct SerialEventSink<P> {
    port: P,
    log: LogEventSink,
}

impl<P: SerialPort> SerialEventSink<P> {
    pub fn new(port: P) -> Self {
        Self {
            port,
            log: LogEventSink,
        }
    }
}

impl<P: SerialPort> EventSink for SerialEventSink<P> {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Report(line) => self.port.write_line(line),
            AppEvent::ResetRequest => {
                self.log.emit(event);
                self.port.write_line(RESET_REQUEST_LINE);
            }
            other => self.log.emit(other),
        }
    }
}
