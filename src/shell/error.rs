//! Shell error types.
//!
//! Every variant is recovered locally by printing one line and mutating
//! nothing; the `Display` text is the exact line the user sees.

/// Command execution error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellError {
    /// Wrong argument count; carries the command's usage string.
    Usage(&'static str),
    /// No such command in the dispatch table.
    UnknownCommand,
    /// Task creation failed while handling the command.
    OutOfMemory,
}

impl core::fmt::Display for ShellError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Usage(usage) => write!(f, "Usage: {}", usage),
            Self::UnknownCommand => write!(f, "unknown command"),
            Self::OutOfMemory => write!(f, "out of memory"),
        }
    }
}
