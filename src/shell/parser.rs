//! Command line parser.
//!
//! Split on whitespace, max 3 captured arguments. The diagnostic
//! commands reject any argument, so only the count matters to them.

/// Parsed command with up to 3 arguments.
#[derive(Debug, Clone)]
pub struct ParsedCommand<'a> {
    /// The command name (first token).
    pub command: &'a str,
    /// Captured arguments; tokens beyond the third are dropped but
    /// still counted.
    pub args: [Option<&'a str>; 3],
    arg_count: usize,
}

impl<'a> ParsedCommand<'a> {
    /// Get argument by index (0-based).
    pub fn arg(&self, idx: usize) -> Option<&'a str> {
        self.args.get(idx).copied().flatten()
    }

    /// Number of arguments given on the line, including dropped ones.
    pub fn arg_count(&self) -> usize {
        self.arg_count
    }
}

/// Parse a command line into command and arguments.
pub fn parse_line(line: &str) -> ParsedCommand<'_> {
    let mut parts = line.split_whitespace();

    let command = parts.next().unwrap_or("");

    let mut args = [None, None, None];
    let mut arg_count = 0;
    for arg in parts {
        if arg_count < args.len() {
            args[arg_count] = Some(arg);
        }
        arg_count += 1;
    }

    ParsedCommand {
        command,
        args,
        arg_count,
    }
}
