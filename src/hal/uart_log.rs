//! UART drain for the diagnostic log ring.
//!
//! TX-only on a dedicated pin, kept separate from the USB shell stream
//! so session output and firmware logs never interleave. The main task
//! drains on its poll cadence; no dedicated thread.

use esp_idf_svc::hal::gpio;
use esp_idf_svc::hal::peripheral::Peripheral;
use esp_idf_svc::hal::uart::{self, UartTxDriver};
use esp_idf_svc::sys::EspError;

use crate::config::LOG_UART_BAUD;
use crate::logging::{format_entry, LogRing};

use super::timestamp_ms;

/// Formatted-line scratch size: message plus timestamp/level prefix.
const LINE_BUF_SIZE: usize = 160;

/// Interval between dropped-message reports.
const DROP_REPORT_INTERVAL_MS: i64 = 10_000;

pub struct UartLog<'d> {
    tx: UartTxDriver<'d>,
    last_drop_report_ms: i64,
}

impl<'d> UartLog<'d> {
    /// TX-only driver on the log pin.
    pub fn new(
        uart: impl Peripheral<P = impl uart::Uart> + 'd,
        tx_pin: impl Peripheral<P = impl gpio::OutputPin> + 'd,
    ) -> Result<Self, EspError> {
        let config =
            uart::config::Config::default().baudrate(esp_idf_svc::hal::units::Hertz(LOG_UART_BAUD));

        let tx = UartTxDriver::new(
            uart,
            tx_pin,
            Option::<gpio::AnyIOPin>::None, // CTS
            Option::<gpio::AnyIOPin>::None, // RTS
            &config,
        )?;

        Ok(Self {
            tx,
            last_drop_report_ms: 0,
        })
    }

    /// Drain all pending entries from `ring`, then report drop counts at
    /// most once per interval.
    pub fn drain(&mut self, ring: &LogRing) {
        let mut line = [0u8; LINE_BUF_SIZE];

        while let Some(entry) = ring.drain() {
            let len = format_entry(&entry, &mut line);
            let _ = self.tx.write(&line[..len]);
        }

        let now = timestamp_ms();
        if now - self.last_drop_report_ms > DROP_REPORT_INTERVAL_MS {
            let dropped = ring.dropped();
            if dropped > 0 {
                let len = crate::logging::format_to_buffer(
                    &mut line,
                    format_args!("[{:8} ms] WARN: {} log messages dropped\r\n", now, dropped),
                );
                let _ = self.tx.write(&line[..len]);
                ring.reset_dropped();
            }
            self.last_drop_report_ms = now;
        }
    }
}
