//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter     | Implements        | Connects to                 |
//! |-------------|-------------------|-----------------------------|
//! | `hardware`  | IndicatorLines    | indicator GPIO inputs       |
//! |             | OverrideLine      | override GPIO               |
//! |             | SenseInput        | ADC1 sense channel          |
//! | `log_sink`  | EventSink         | log output / serial link    |
//! | `nvs`       | ConfigPort        | NVS / in-memory store       |
//! |             | StoragePort       |                             |
//! | `serial`    | SerialPort        | command UART                |
//! | `time`      | (clock)           | ESP32 system timer          |

pub mod hardware;
pub mod log_sink;
pub mod nvs;
pub mod serial;
pub mod time;
