//! Diagnostic shell over the USB-serial transport.
//!
//! Line-oriented text protocol: one command per line, text block in
//! response. Command handlers are polymorphic capabilities behind
//! [`DiagCommand`] and read scheduler state only through the
//! [`Diagnostics`] trait, so the session plumbing never depends on
//! their internals. Zero heap allocation.

pub mod commands;
pub mod error;
pub mod line_buffer;
pub mod parser;
pub mod session;

pub use commands::{
    execute, DiagCommand, Diagnostics, HeapStats, SelfTestReport, ThreadInfo, ThreadState,
    COMMANDS,
};
pub use error::ShellError;
pub use line_buffer::LineBuffer;
pub use parser::{parse_line, ParsedCommand};
pub use session::{Session, SessionEvent};
