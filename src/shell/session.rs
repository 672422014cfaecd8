//! Shell session state machine.
//!
//! Byte-at-a-time processing of the transport stream: echo, line
//! editing, dispatch on CR/LF. At most one session exists at a time;
//! it is created by the supervisor and ends itself on `exit` or when
//! the transport drops (the task loop feeding it stops on read failure).

use core::fmt::Write;

use super::commands::{execute, Diagnostics};
use super::line_buffer::LineBuffer;
use super::parser::parse_line;

/// Version string (set by build.rs, includes git hash).
pub const VERSION: &str = env!("VERSION_STRING");

/// What a processed byte led to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    /// More input needed.
    Idle,
    /// A full line was dispatched.
    Dispatched,
    /// The user ended the session.
    Exit,
}

/// One diagnostic shell session.
pub struct Session {
    line: LineBuffer,
}

impl Session {
    pub const fn new() -> Self {
        Self {
            line: LineBuffer::new(),
        }
    }

    /// Print the welcome banner and first prompt.
    pub fn print_banner(&self, out: &mut dyn Write) {
        let _ = writeln!(out, "\r\n{}\r", VERSION);
        let _ = writeln!(out, "Type 'help' for commands.\r");
        self.print_prompt(out);
    }

    pub fn print_prompt(&self, out: &mut dyn Write) {
        let _ = write!(out, "diag> ");
    }

    /// Process a single input byte.
    pub fn process_byte(
        &mut self,
        byte: u8,
        diag: &dyn Diagnostics,
        out: &mut dyn Write,
    ) -> SessionEvent {
        match byte {
            // Enter
            b'\r' | b'\n' => {
                let _ = write!(out, "\r\n");
                let line = self.line.as_str();

                if line.trim() == "exit" {
                    let _ = writeln!(out, "bye\r");
                    return SessionEvent::Exit;
                }

                if !line.is_empty() {
                    let cmd = parse_line(line);
                    if let Err(err) = execute(&cmd, diag, out) {
                        let _ = writeln!(out, "{}\r", err);
                    }
                    self.line.clear();
                    self.print_prompt(out);
                    return SessionEvent::Dispatched;
                }

                self.print_prompt(out);
                SessionEvent::Idle
            }

            // Backspace
            0x7F | 0x08 => {
                if !self.line.is_empty() {
                    self.line.backspace();
                    // Echo: backspace, space, backspace
                    let _ = write!(out, "\x08 \x08");
                }
                SessionEvent::Idle
            }

            // Ctrl+C
            0x03 => {
                let _ = writeln!(out, "^C\r");
                self.line.clear();
                self.print_prompt(out);
                SessionEvent::Idle
            }

            // Printable character; no echo once the buffer is full, so
            // the terminal line always matches what will be dispatched.
            0x20..=0x7E => {
                if self.line.push(byte) {
                    let _ = write!(out, "{}", byte as char);
                }
                SessionEvent::Idle
            }

            _ => SessionEvent::Idle,
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
