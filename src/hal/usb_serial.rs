//! USB-Serial-JTAG transport for the diagnostic shell.
//!
//! The driver is a global singleton; [`UsbSerial`] is a copyable handle
//! to it, so the supervisor can probe the connection state while the
//! shell task reads and writes the stream.

use core::ffi::c_void;

use esp_idf_svc::sys as esp_idf_sys;
use esp_idf_svc::sys::{esp, EspError};

use crate::supervisor::TransportStatus;

use super::ticks;

const RX_BUFFER_SIZE: u32 = 256;
const TX_BUFFER_SIZE: u32 = 256;

/// Ticks to wait for TX ring space before dropping output bytes.
const WRITE_TIMEOUT_MS: u32 = 20;

/// Handle to the installed USB-Serial-JTAG driver.
#[derive(Clone, Copy)]
pub struct UsbSerial(());

impl UsbSerial {
    /// Install the driver. Called once at boot.
    pub fn install() -> Result<Self, EspError> {
        let mut cfg = esp_idf_sys::usb_serial_jtag_driver_config_t {
            rx_buffer_size: RX_BUFFER_SIZE,
            tx_buffer_size: TX_BUFFER_SIZE,
        };
        esp!(unsafe { esp_idf_sys::usb_serial_jtag_driver_install(&mut cfg) })?;
        Ok(Self(()))
    }

    /// Handle for code that runs after boot. Requires
    /// [`UsbSerial::install`] to have completed.
    pub(crate) fn handle() -> Self {
        Self(())
    }

    /// Whether a host is connected to the virtual serial port.
    pub fn is_connected(&self) -> bool {
        unsafe { esp_idf_sys::usb_serial_jtag_is_connected() }
    }

    /// Read one byte, waiting at most `timeout_ms`. `None` on timeout.
    pub fn read_byte(&self, timeout_ms: u32) -> Option<u8> {
        let mut byte = 0u8;
        let n = unsafe {
            esp_idf_sys::usb_serial_jtag_read_bytes(
                &mut byte as *mut u8 as *mut c_void,
                1,
                ticks(timeout_ms),
            )
        };
        (n == 1).then_some(byte)
    }

    /// Write bytes to the stream. Bytes that do not fit the TX ring
    /// within the timeout are dropped.
    pub fn write_bytes(&self, buf: &[u8]) {
        unsafe {
            esp_idf_sys::usb_serial_jtag_write_bytes(
                buf.as_ptr() as *const c_void,
                buf.len() as _,
                ticks(WRITE_TIMEOUT_MS),
            );
        }
    }
}

impl TransportStatus for UsbSerial {
    fn is_active(&self) -> bool {
        self.is_connected()
    }
}

impl core::fmt::Write for UsbSerial {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        self.write_bytes(s.as_bytes());
        Ok(())
    }
}
