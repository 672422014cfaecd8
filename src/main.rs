//! Firmware entry point.
//!
//! Boot order: peripherals, log UART, PWM timer and channels, USB
//! transport, then the stepper sequencer task at elevated priority.
//! The main task itself becomes the session supervisor loop and drains
//! the diagnostic log on the same cadence.
//!
//! The system runs until power loss or reset; there is no exit path.

#![cfg_attr(all(not(test), target_os = "espidf"), no_std)]
#![cfg_attr(all(not(test), target_os = "espidf"), no_main)]

#[cfg(all(not(test), target_os = "espidf"))]
use esp_idf_svc::sys as esp_idf_sys;

#[cfg(all(not(test), target_os = "espidf"))]
use esp_idf_svc::hal::peripherals::Peripherals;

#[cfg(all(not(test), target_os = "espidf"))]
use stepper_diag::{
    config::PHASE_PINS,
    diag_info, diag_warn,
    hal::{self, pwm, tasks, uart_log::UartLog, usb_serial::UsbSerial},
    logging::DIAG_LOG,
    supervisor::{PollEvent, SessionSupervisor},
};

#[cfg(all(not(test), target_os = "espidf"))]
#[no_mangle]
fn main() {
    esp_idf_sys::link_patches();

    // Bring-up failures are below the core's responsibility; park.
    if boot().is_err() {
        loop {
            hal::delay_ms(1_000);
        }
    }
}

#[cfg(all(not(test), target_os = "espidf"))]
fn boot() -> Result<(), esp_idf_sys::EspError> {
    let peripherals = Peripherals::take()?;

    // gpio17 is config::LOG_UART_TX_PIN.
    let mut uart = UartLog::new(peripherals.uart1, peripherals.pins.gpio17)?;

    pwm::configure(&PHASE_PINS)?;
    let usb = UsbSerial::install()?;

    tasks::spawn_stepper()?;
    diag_info!(hal::timestamp_ms(), "stepper sequencer started");

    let mut supervisor = SessionSupervisor::new(usb, tasks::EspShellSpawner::new());

    loop {
        match supervisor.poll() {
            PollEvent::SessionStarted => {
                diag_info!(hal::timestamp_ms(), "shell session started");
            }
            PollEvent::SessionReclaimed => {
                diag_info!(hal::timestamp_ms(), "shell session reclaimed");
            }
            PollEvent::SpawnFailed => {
                diag_warn!(
                    hal::timestamp_ms(),
                    "shell spawn failed, retrying next poll"
                );
            }
            PollEvent::Idle => {}
        }

        uart.drain(&DIAG_LOG);
        hal::delay_ms(supervisor.poll_interval_ms());
    }
}

/// Host builds only compile the library; there is nothing to run.
#[cfg(not(all(not(test), target_os = "espidf")))]
fn main() {}
