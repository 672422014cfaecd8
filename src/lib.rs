//! # stepper-diag
//!
//! Firmware for a 4-phase stepper motor driven by half-step PWM, with a
//! diagnostic command shell on the USB-serial transport.
//!
//! ## Architecture
//!
//! Two tasks run unattended from boot and never talk to each other:
//! - [`StepSequencer`] walks the half-step transition table at a fixed
//!   1 ms cadence, writing duty values into a [`PwmSink`].
//! - [`SessionSupervisor`] polls the transport every 500 ms and owns the
//!   lifecycle of at most one shell session task.
//!
//! The shell commands only read scheduler state (heap, task registry);
//! neither task shares data with the other.
//!
//! All modules here are host-testable; hardware bindings live in
//! [`hal`] and are compiled only when targeting ESP-IDF.

#![cfg_attr(not(test), no_std)]

pub mod config;
pub mod hal;
pub mod logging;
pub mod shell;
pub mod stepper;
pub mod supervisor;

pub use logging::DIAG_LOG;
pub use shell::{Diagnostics, Session, ShellError};
pub use stepper::{Phase, PwmSink, StepSequencer, Transition};
pub use supervisor::{SessionSupervisor, SupervisorState, TaskState};
