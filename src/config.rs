//! Compile-time firmware parameters.
//!
//! Everything here is fixed at build time; there is no persisted
//! configuration. Values that mirror an `sdkconfig.defaults` entry say
//! so next to the constant.

/// PWM carrier frequency driving the motor windings.
pub const PWM_CARRIER_HZ: u32 = 20_000;

/// PWM counting period; duty values range over `0..=PWM_MAX_DUTY`.
pub const PWM_MAX_DUTY: u32 = 128;

/// Inter-step suspension of the stepper sequencer.
pub const STEP_INTERVAL_MS: u32 = 1;

/// Cadence at which the session supervisor re-evaluates transport and
/// session state. Connection changes are detected with up to this much
/// latency; that staleness is accepted.
pub const SUPERVISOR_POLL_MS: u32 = 500;

/// FreeRTOS tick rate. Mirrors `CONFIG_FREERTOS_HZ` in
/// `sdkconfig.defaults`; a 1 kHz tick is required for the 1 ms step
/// interval.
pub const TICK_RATE_HZ: u32 = 1_000;

/// Priority of the main task under ESP-IDF.
pub const DEFAULT_TASK_PRIORITY: u32 = 1;

/// Stepper sequencer priority. Elevated so diagnostic activity cannot
/// starve the step cadence.
pub const STEPPER_TASK_PRIORITY: u32 = DEFAULT_TASK_PRIORITY + 10;

/// Shell session task priority.
pub const SHELL_TASK_PRIORITY: u32 = DEFAULT_TASK_PRIORITY;

/// Stack sizes in bytes.
pub const STEPPER_TASK_STACK: u32 = 2_048;
pub const SHELL_TASK_STACK: u32 = 4_096;
pub const SELF_TEST_TASK_STACK: u32 = 2_048;

/// GPIO pins for the four windings, indexed by PWM channel
/// (phase A..D, wire colors blue, pink, yellow, orange).
pub const PHASE_PINS: [i32; 4] = [9, 10, 11, 12];

/// UART TX pin for the diagnostic log drain (kept separate from the
/// USB shell stream).
pub const LOG_UART_TX_PIN: i32 = 17;

/// Log UART baud rate.
pub const LOG_UART_BAUD: u32 = 115_200;
