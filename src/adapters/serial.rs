//! UART serial link adapter.
//!
//! Implements [`SerialPort`] over the command UART.  The handle is a plain
//! marker: the ESP-IDF driver owns the port, so reader and writer sides
//! can live in different owners.

use crate::app::ports::SerialPort;
use crate::drivers::hw_init;

#[derive(Debug, Clone, Copy, Default)]
pub struct UartSerial;

impl SerialPort for UartSerial {
    fn read_byte(&mut self) -> Option<u8> {
        hw_init::uart_read_byte()
    }

    fn write_line(&mut self, line: &str) {
        hw_init::uart_write(line.as_bytes());
        hw_init::uart_write(b"\r\n");
    }
}
