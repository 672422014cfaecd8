//! Diagnostic command set.
//!
//! Three introspection commands over scheduler-owned state: `mem`
//! (heap accounting), `threads` (task registry), `test` (built-in
//! self-test). Each rejects any argument with a usage line and no state
//! change. A `help` command lists the table.
//!
//! Handlers are trait objects over [`Diagnostics`], the capability that
//! the scheduler glue implements on hardware and tests fake on the host.

use core::fmt::Write;

use super::error::ShellError;
use super::parser::ParsedCommand;
use crate::supervisor::SpawnError;

/// Scheduler-level lifecycle of a registered task. Closed sum type with
/// explicit rendering; no name-table indexing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ThreadState {
    Running,
    Ready,
    Blocked,
    Suspended,
    Deleted,
    Invalid,
}

impl ThreadState {
    pub fn as_str(self) -> &'static str {
        match self {
            ThreadState::Running => "running",
            ThreadState::Ready => "ready",
            ThreadState::Blocked => "blocked",
            ThreadState::Suspended => "suspended",
            ThreadState::Deleted => "deleted",
            ThreadState::Invalid => "invalid",
        }
    }
}

/// Heap accounting snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HeapStats {
    /// Bytes never handed to the allocator.
    pub core_free: usize,
    /// Number of free fragments.
    pub fragments: usize,
    /// Total free bytes across all fragments.
    pub free_total: usize,
}

/// One row of the task registry.
#[derive(Clone, Copy, Debug)]
pub struct ThreadInfo {
    pub address: usize,
    pub stack_ptr: usize,
    pub priority: u32,
    pub refs: u32,
    pub state: ThreadState,
}

/// Outcome of a completed self-test run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SelfTestReport {
    pub passed: u32,
    pub failed: u32,
}

/// Introspection surfaces the shell consumes but does not own.
pub trait Diagnostics {
    fn heap_stats(&self) -> HeapStats;

    /// Visit every registered task, in registry order.
    fn for_each_thread(&self, visit: &mut dyn FnMut(ThreadInfo));

    /// Spawn the built-in self-test task and block until it completes.
    /// Fails without blocking when no memory is available for the task.
    fn run_self_test(&self) -> Result<SelfTestReport, SpawnError>;
}

/// One shell command: a single execute capability.
pub trait DiagCommand: Sync {
    fn execute(
        &self,
        cmd: &ParsedCommand<'_>,
        diag: &dyn Diagnostics,
        out: &mut dyn Write,
    ) -> Result<(), ShellError>;
}

/// Dispatch table entry.
pub struct CommandEntry {
    pub name: &'static str,
    pub brief: &'static str,
    pub handler: &'static dyn DiagCommand,
}

/// All available commands.
pub static COMMANDS: &[CommandEntry] = &[
    CommandEntry {
        name: "help",
        brief: "List commands",
        handler: &HelpCommand,
    },
    CommandEntry {
        name: "mem",
        brief: "Heap status",
        handler: &MemCommand,
    },
    CommandEntry {
        name: "threads",
        brief: "Task registry",
        handler: &ThreadsCommand,
    },
    CommandEntry {
        name: "test",
        brief: "Run the built-in self-test",
        handler: &TestCommand,
    },
];

/// Execute a parsed command against the dispatch table.
pub fn execute(
    cmd: &ParsedCommand<'_>,
    diag: &dyn Diagnostics,
    out: &mut dyn Write,
) -> Result<(), ShellError> {
    if cmd.command.is_empty() {
        return Ok(());
    }

    let entry = COMMANDS
        .iter()
        .find(|c| c.name == cmd.command)
        .ok_or(ShellError::UnknownCommand)?;

    entry.handler.execute(cmd, diag, out)
}

// --- Command implementations ---

pub struct HelpCommand;

impl DiagCommand for HelpCommand {
    fn execute(
        &self,
        cmd: &ParsedCommand<'_>,
        _diag: &dyn Diagnostics,
        out: &mut dyn Write,
    ) -> Result<(), ShellError> {
        if cmd.arg_count() > 0 {
            return Err(ShellError::Usage("help"));
        }
        for c in COMMANDS {
            let _ = writeln!(out, "  {:<8} {}\r", c.name, c.brief);
        }
        let _ = writeln!(out, "  {:<8} {}\r", "exit", "End the session");
        Ok(())
    }
}

pub struct MemCommand;

impl DiagCommand for MemCommand {
    fn execute(
        &self,
        cmd: &ParsedCommand<'_>,
        diag: &dyn Diagnostics,
        out: &mut dyn Write,
    ) -> Result<(), ShellError> {
        if cmd.arg_count() > 0 {
            return Err(ShellError::Usage("mem"));
        }

        let heap = diag.heap_stats();
        let _ = writeln!(out, "core free memory : {} bytes\r", heap.core_free);
        let _ = writeln!(out, "heap fragments   : {}\r", heap.fragments);
        let _ = writeln!(out, "heap free total  : {} bytes\r", heap.free_total);
        Ok(())
    }
}

pub struct ThreadsCommand;

impl DiagCommand for ThreadsCommand {
    fn execute(
        &self,
        cmd: &ParsedCommand<'_>,
        diag: &dyn Diagnostics,
        out: &mut dyn Write,
    ) -> Result<(), ShellError> {
        if cmd.arg_count() > 0 {
            return Err(ShellError::Usage("threads"));
        }

        let _ = writeln!(out, "    addr    stack prio refs     state\r");
        diag.for_each_thread(&mut |t| {
            let _ = writeln!(
                out,
                "{:08x} {:08x} {:4} {:4} {:>9}\r",
                t.address,
                t.stack_ptr,
                t.priority,
                t.refs,
                t.state.as_str()
            );
        });
        Ok(())
    }
}

pub struct TestCommand;

impl DiagCommand for TestCommand {
    fn execute(
        &self,
        cmd: &ParsedCommand<'_>,
        diag: &dyn Diagnostics,
        out: &mut dyn Write,
    ) -> Result<(), ShellError> {
        if cmd.arg_count() > 0 {
            return Err(ShellError::Usage("test"));
        }

        match diag.run_self_test() {
            Ok(report) => {
                let _ = writeln!(
                    out,
                    "self test: {} passed, {} failed\r",
                    report.passed, report.failed
                );
                Ok(())
            }
            Err(SpawnError::OutOfMemory) => Err(ShellError::OutOfMemory),
        }
    }
}
