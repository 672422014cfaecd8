//! Hardware bindings for ESP-IDF.
//!
//! Thin wrappers around LEDC PWM, USB-Serial-JTAG, UART, and the
//! FreeRTOS scheduler. Business logic stays in the core modules; this
//! layer is just I/O and is compiled only when targeting the chip.

#[cfg(all(not(test), target_os = "espidf"))]
pub mod pwm;
#[cfg(all(not(test), target_os = "espidf"))]
pub mod tasks;
#[cfg(all(not(test), target_os = "espidf"))]
pub mod uart_log;
#[cfg(all(not(test), target_os = "espidf"))]
pub mod usb_serial;

#[cfg(all(not(test), target_os = "espidf"))]
mod time {
    use crate::config::TICK_RATE_HZ;
    use esp_idf_svc::sys as esp_idf_sys;

    /// Convert milliseconds to FreeRTOS ticks (tick rate pinned to
    /// 1 kHz in `sdkconfig.defaults`).
    pub fn ticks(ms: u32) -> u32 {
        (ms * TICK_RATE_HZ / 1_000).max(1)
    }

    /// Voluntary bounded suspension of the calling task.
    pub fn delay_ms(ms: u32) {
        unsafe { esp_idf_sys::vTaskDelay(ticks(ms)) };
    }

    /// Milliseconds since boot.
    pub fn timestamp_ms() -> i64 {
        unsafe { esp_idf_sys::esp_timer_get_time() / 1_000 }
    }
}

#[cfg(all(not(test), target_os = "espidf"))]
pub use time::{delay_ms, ticks, timestamp_ms};
