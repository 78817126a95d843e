//! One-shot hardware peripheral initialization and raw pin helpers.
//!
//! Configures the indicator inputs, the override line, the sense ADC and
//! the serial UART using raw ESP-IDF sys calls.  Called once from `main()`
//! before the control loop starts.
//!
//! On host builds every helper is backed by a simulation cell so the
//! adapters above can be exercised without hardware.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::info;

#[cfg(target_os = "espidf")]
use crate::acquisition::latch::SignalLatch;
#[cfg(target_os = "espidf")]
use crate::pins;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    AdcInitFailed(i32),
    GpioConfigFailed(i32),
    UartInitFailed(i32),
    IsrInstallFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::AdcInitFailed(rc) => write!(f, "ADC1 init failed (rc={})", rc),
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={})", rc),
            Self::UartInitFailed(rc) => write!(f, "UART init failed (rc={})", rc),
            Self::IsrInstallFailed(rc) => write!(f, "GPIO ISR service install failed (rc={})", rc),
        }
    }
}

impl From<HwInitError> for crate::error::Error {
    fn from(e: HwInitError) -> Self {
        Self::Init(match e {
            HwInitError::AdcInitFailed(_) => "sense ADC",
            HwInitError::GpioConfigFailed(_) => "GPIO",
            HwInitError::UartInitFailed(_) => "UART",
            HwInitError::IsrInstallFailed(_) => "GPIO ISR",
        })
    }
}

#[cfg(target_os = "espidf")]
pub fn init_peripherals() -> Result<(), HwInitError> {
    // SAFETY: Called once from main() before the control loop; single-threaded.
    unsafe {
        init_adc()?;
        init_indicator_inputs()?;
        init_override()?;
        init_uart()?;
    }
    info!("hw_init: all peripherals configured");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_peripherals() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): peripheral init skipped");
    Ok(())
}

// ── ADC (oneshot) ─────────────────────────────────────────────

#[cfg(target_os = "espidf")]
static mut ADC1_HANDLE: adc_oneshot_unit_handle_t = core::ptr::null_mut();

/// SAFETY: Must be called only from the single-threaded init path or the
/// main-loop ADC read path.  `init_adc()` completes before the loop starts.
#[cfg(target_os = "espidf")]
unsafe fn adc1_handle() -> adc_oneshot_unit_handle_t {
    unsafe { ADC1_HANDLE }
}

#[cfg(target_os = "espidf")]
unsafe fn init_adc() -> Result<(), HwInitError> {
    let init_cfg = adc_oneshot_unit_init_cfg_t {
        unit_id: adc_unit_t_ADC_UNIT_1,
        ulp_mode: adc_ulp_mode_t_ADC_ULP_MODE_DISABLE,
        ..Default::default()
    };
    // SAFETY: ADC1_HANDLE is only written here, once at boot.
    let ret = unsafe { adc_oneshot_new_unit(&init_cfg, &raw mut ADC1_HANDLE) };
    if ret != ESP_OK as esp_err_t {
        return Err(HwInitError::AdcInitFailed(ret));
    }

    let chan_cfg = adc_oneshot_chan_cfg_t {
        atten: adc_atten_t_ADC_ATTEN_DB_12,
        bitwidth: adc_bitwidth_t_ADC_BITWIDTH_12,
    };
    let ret = unsafe {
        adc_oneshot_config_channel(adc1_handle(), pins::SENSE_ADC_CHANNEL, &chan_cfg)
    };
    if ret != ESP_OK as esp_err_t {
        return Err(HwInitError::AdcInitFailed(ret));
    }

    info!("hw_init: ADC1 configured (CH{}=sense)", pins::SENSE_ADC_CHANNEL);
    Ok(())
}

/// 12-bit sense reading; 0 on a failed conversion.
#[cfg(target_os = "espidf")]
pub fn sense_read() -> u16 {
    let mut raw: i32 = 0;
    // SAFETY: adc1_handle() contract, main-loop access only.
    let ret = unsafe { adc_oneshot_read(adc1_handle(), pins::SENSE_ADC_CHANNEL, &mut raw) };
    if ret != ESP_OK as esp_err_t {
        return 0;
    }
    raw.max(0) as u16
}

// ── Indicator inputs ──────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_indicator_inputs() -> Result<(), HwInitError> {
    let mask = pins::INDICATOR_GPIOS.iter().fold(0u64, |m, &p| m | 1u64 << p);
    let cfg = gpio_config_t {
        pin_bit_mask: mask,
        mode: gpio_mode_t_GPIO_MODE_INPUT,
        pull_up_en: gpio_pullup_t_GPIO_PULLUP_ENABLE,
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_ANYEDGE,
    };
    let ret = unsafe { gpio_config(&cfg) };
    if ret != ESP_OK as esp_err_t {
        return Err(HwInitError::GpioConfigFailed(ret));
    }
    info!("hw_init: indicator inputs configured");
    Ok(())
}

/// Raw indicator levels, bit `i` = `INDICATOR_GPIOS[i]`.  ISR-safe.
#[cfg(target_os = "espidf")]
pub fn indicator_levels() -> u8 {
    let mut levels = 0u8;
    for (i, &pin) in pins::INDICATOR_GPIOS.iter().enumerate() {
        // SAFETY: gpio_get_level is a register read on a configured input.
        if unsafe { gpio_get_level(pin) } != 0 {
            levels |= 1 << i;
        }
    }
    levels
}

// ── Override line ─────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_override() -> Result<(), HwInitError> {
    let cfg = gpio_config_t {
        pin_bit_mask: 1u64 << pins::OVERRIDE_GPIO,
        mode: gpio_mode_t_GPIO_MODE_INPUT,
        pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
    };
    let ret = unsafe { gpio_config(&cfg) };
    if ret != ESP_OK as esp_err_t {
        return Err(HwInitError::GpioConfigFailed(ret));
    }
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn override_drive_high() {
    // SAFETY: main-loop only; the pin was configured in init_override().
    unsafe {
        gpio_set_level(pins::OVERRIDE_GPIO, 1);
        gpio_set_direction(pins::OVERRIDE_GPIO, gpio_mode_t_GPIO_MODE_OUTPUT);
    }
}

#[cfg(target_os = "espidf")]
pub fn override_release() {
    // SAFETY: main-loop only; the pin was configured in init_override().
    unsafe {
        gpio_set_direction(pins::OVERRIDE_GPIO, gpio_mode_t_GPIO_MODE_INPUT);
        gpio_set_pull_mode(pins::OVERRIDE_GPIO, gpio_pull_mode_t_GPIO_FLOATING);
    }
}

// ── UART ──────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
const UART_RX_BUF: i32 = 256;

#[cfg(target_os = "espidf")]
unsafe fn init_uart() -> Result<(), HwInitError> {
    let cfg = uart_config_t {
        baud_rate: pins::SERIAL_BAUD,
        data_bits: uart_word_length_t_UART_DATA_8_BITS,
        parity: uart_parity_t_UART_PARITY_DISABLE,
        stop_bits: uart_stop_bits_t_UART_STOP_BITS_1,
        flow_ctrl: uart_hw_flowcontrol_t_UART_HW_FLOWCTRL_DISABLE,
        ..Default::default()
    };
    // SAFETY: single call at boot; the driver owns the port afterwards.
    unsafe {
        let ret = uart_param_config(pins::SERIAL_UART, &cfg);
        if ret != ESP_OK as esp_err_t {
            return Err(HwInitError::UartInitFailed(ret));
        }
        let ret = uart_set_pin(
            pins::SERIAL_UART,
            pins::SERIAL_TX_GPIO,
            pins::SERIAL_RX_GPIO,
            -1,
            -1,
        );
        if ret != ESP_OK as esp_err_t {
            return Err(HwInitError::UartInitFailed(ret));
        }
        let ret = uart_driver_install(
            pins::SERIAL_UART,
            UART_RX_BUF,
            0,
            0,
            core::ptr::null_mut(),
            0,
        );
        if ret != ESP_OK as esp_err_t {
            return Err(HwInitError::UartInitFailed(ret));
        }
    }
    info!("hw_init: UART{} at {} baud", pins::SERIAL_UART, pins::SERIAL_BAUD);
    Ok(())
}

/// One pending byte, without waiting.
#[cfg(target_os = "espidf")]
pub fn uart_read_byte() -> Option<u8> {
    let mut b = 0u8;
    // SAFETY: driver installed in init_uart(); zero-tick timeout never blocks.
    let n = unsafe { uart_read_bytes(pins::SERIAL_UART, (&raw mut b).cast(), 1, 0) };
    (n == 1).then_some(b)
}

#[cfg(target_os = "espidf")]
pub fn uart_write(data: &[u8]) {
    // SAFETY: driver installed in init_uart(); the call copies `data`.
    unsafe {
        uart_write_bytes(pins::SERIAL_UART, data.as_ptr().cast(), data.len());
    }
}

// ── GPIO ISR Service ──────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe extern "C" fn indicator_isr(arg: *mut core::ffi::c_void) {
    // SAFETY: `arg` is the &'static SignalLatch registered below.
    let latch = unsafe { &*(arg as *const SignalLatch) };
    // SAFETY: esp_timer_get_time is a counter read; safe in ISR context.
    let now_ms = (unsafe { esp_timer_get_time() } / 1_000) as u32;
    latch.on_edge(&mut crate::adapters::hardware::EspIndicatorLines, now_ms);
}

/// Install the GPIO ISR service and route every indicator edge to `latch`.
/// Call after init_peripherals() and before the control loop.
#[cfg(target_os = "espidf")]
pub fn init_isr_service(latch: &'static SignalLatch) -> Result<(), HwInitError> {
    let arg = core::ptr::from_ref(latch).cast_mut().cast::<core::ffi::c_void>();
    // SAFETY: gpio_install_isr_service is idempotent; ESP_ERR_INVALID_STATE
    // means it was already installed.  The handler only reads pins and the
    // clock and updates the latch under a critical section.
    unsafe {
        let ret = gpio_install_isr_service(0);
        if ret != ESP_OK as esp_err_t && ret != ESP_ERR_INVALID_STATE as esp_err_t {
            return Err(HwInitError::IsrInstallFailed(ret));
        }
        for &pin in &pins::INDICATOR_GPIOS {
            let ret = gpio_isr_handler_add(pin, Some(indicator_isr), arg);
            if ret != ESP_OK as esp_err_t {
                return Err(HwInitError::IsrInstallFailed(ret));
            }
            gpio_intr_enable(pin);
        }
    }
    // seed the latch with the current levels
    let now_ms = (unsafe { esp_timer_get_time() } / 1_000) as u32;
    latch.on_edge(&mut crate::adapters::hardware::EspIndicatorLines, now_ms);
    info!("hw_init: ISR service installed on {} indicator lines", pins::INDICATOR_GPIOS.len());
    Ok(())
}

// ── Simulation backend ────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
pub use sim::*;

#[cfg(not(target_os = "espidf"))]
mod sim {
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU16, Ordering};

    use crate::acquisition::ACTIVE_LOW_MASK;
    use crate::acquisition::latch::SignalLatch;

    // All lines idle: active-low, so every level high.
    static LINES: AtomicU8 = AtomicU8::new(ACTIVE_LOW_MASK);
    static SENSE: AtomicU16 = AtomicU16::new(0);
    static OVERRIDE_HIGH: AtomicBool = AtomicBool::new(false);
    static UART_RX: Mutex<VecDeque<u8>> = Mutex::new(VecDeque::new());
    static UART_TX: Mutex<Vec<u8>> = Mutex::new(Vec::new());

    pub fn init_isr_service(_latch: &'static SignalLatch) -> Result<(), super::HwInitError> {
        log::info!("hw_init(sim): ISR service skipped");
        Ok(())
    }

    pub fn indicator_levels() -> u8 {
        LINES.load(Ordering::Relaxed)
    }

    pub fn sense_read() -> u16 {
        SENSE.load(Ordering::Relaxed)
    }

    pub fn override_drive_high() {
        OVERRIDE_HIGH.store(true, Ordering::Relaxed);
    }

    pub fn override_release() {
        OVERRIDE_HIGH.store(false, Ordering::Relaxed);
    }

    pub fn uart_read_byte() -> Option<u8> {
        UART_RX.lock().ok()?.pop_front()
    }

    pub fn uart_write(data: &[u8]) {
        if let Ok(mut tx) = UART_TX.lock() {
            tx.extend_from_slice(data);
        }
    }

    /// Set raw line levels (bit `i` high = line `i` high = indicator dark).
    pub fn sim_set_lines(levels: u8) {
        LINES.store(levels, Ordering::Relaxed);
    }

    pub fn sim_set_sense(raw: u16) {
        SENSE.store(raw, Ordering::Relaxed);
    }

    pub fn sim_override_high() -> bool {
        OVERRIDE_HIGH.load(Ordering::Relaxed)
    }

    pub fn sim_uart_feed(data: &[u8]) {
        if let Ok(mut rx) = UART_RX.lock() {
            rx.extend(data.iter().copied());
        }
    }

    /// Everything written to the UART since the last call.
    pub fn sim_uart_take() -> Vec<u8> {
        UART_TX.lock().map(|mut tx| std::mem::take(&mut *tx)).unwrap_or_default()
    }
}
