//! Diagnostic event logging.
//!
//! A static lock-free ring of fixed-size entries. Producers (the
//! supervisor loop, the shell task, the self-test) push without
//! blocking; the main task drains to the log UART on its poll cadence.
//! When the ring is full, new messages are dropped and counted.

use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicU32, Ordering};

/// Maximum message length.
pub const MAX_MSG_LEN: usize = 96;

/// Ring capacity (number of entries). Must be a power of two.
pub const RING_SIZE: usize = 64;

/// Log level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LogLevel {
    Error = 0,
    Warn = 1,
    Info = 2,
    Debug = 3,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warn => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
        }
    }
}

/// A single log entry.
#[derive(Clone, Copy)]
pub struct LogEntry {
    /// Milliseconds since boot.
    pub timestamp_ms: i64,
    pub level: LogLevel,
    /// Message length in bytes.
    pub len: u8,
    /// Message bytes (not null-terminated).
    pub msg: [u8; MAX_MSG_LEN],
}

const EMPTY_ENTRY: LogEntry = LogEntry {
    timestamp_ms: 0,
    level: LogLevel::Info,
    len: 0,
    msg: [0; MAX_MSG_LEN],
};

/// Lock-free log ring: multiple producers, single consumer.
///
/// Producers reserve a slot with a CAS loop, so a full ring rejects the
/// push without consuming a slot. The single consumer may observe an
/// entry whose bytes are still being copied in; messages are plain
/// diagnostic text and truncation of such an entry is tolerated.
pub struct LogRing<const N: usize = RING_SIZE> {
    entries: UnsafeCell<[LogEntry; N]>,
    write_idx: AtomicU32,
    read_idx: AtomicU32,
    dropped: AtomicU32,
}

// SAFETY: slot reservation via CAS on write_idx gives each producer a
// unique index; the single consumer only reads indices below write_idx.
unsafe impl<const N: usize> Sync for LogRing<N> {}
unsafe impl<const N: usize> Send for LogRing<N> {}

impl<const N: usize> LogRing<N> {
    const MASK: usize = N - 1;

    pub const fn new() -> Self {
        assert!(N.is_power_of_two(), "ring size must be a power of two");

        Self {
            entries: UnsafeCell::new([EMPTY_ENTRY; N]),
            write_idx: AtomicU32::new(0),
            read_idx: AtomicU32::new(0),
            dropped: AtomicU32::new(0),
        }
    }

    /// Push an entry without blocking.
    ///
    /// Returns `false` (and counts a drop) if the ring is full.
    pub fn push(&self, timestamp_ms: i64, level: LogLevel, msg: &[u8]) -> bool {
        let mut write = self.write_idx.load(Ordering::Relaxed);
        loop {
            let read = self.read_idx.load(Ordering::Acquire);
            if write.wrapping_sub(read) >= N as u32 {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                return false;
            }
            match self.write_idx.compare_exchange_weak(
                write,
                write.wrapping_add(1),
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(current) => write = current,
            }
        }

        let idx = (write as usize) & Self::MASK;

        // SAFETY: the CAS above reserved `idx` for this producer alone.
        unsafe {
            let entry = &mut (*self.entries.get())[idx];
            entry.timestamp_ms = timestamp_ms;
            entry.level = level;
            entry.len = msg.len().min(MAX_MSG_LEN) as u8;
            entry.msg[..entry.len as usize].copy_from_slice(&msg[..entry.len as usize]);
        }
        true
    }

    /// Drain the next entry, oldest first. `None` when empty.
    pub fn drain(&self) -> Option<LogEntry> {
        let read = self.read_idx.load(Ordering::Relaxed);
        let write = self.write_idx.load(Ordering::Acquire);

        if read == write {
            return None;
        }

        let idx = (read as usize) & Self::MASK;

        // SAFETY: single consumer; `idx` is below the published write index.
        let entry = unsafe { (*self.entries.get())[idx] };

        self.read_idx.store(read.wrapping_add(1), Ordering::Release);
        Some(entry)
    }

    pub fn pending(&self) -> u32 {
        let read = self.read_idx.load(Ordering::Relaxed);
        let write = self.write_idx.load(Ordering::Acquire);
        write.wrapping_sub(read)
    }

    /// Count of messages dropped since the last reset.
    pub fn dropped(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn reset_dropped(&self) {
        self.dropped.store(0, Ordering::Relaxed);
    }
}

impl<const N: usize> Default for LogRing<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// The firmware-wide diagnostic log, drained by the main task.
pub static DIAG_LOG: LogRing = LogRing::new();

/// Format arguments into a byte buffer, truncating on overflow.
///
/// Returns the number of bytes written.
pub fn format_to_buffer(buf: &mut [u8], args: core::fmt::Arguments<'_>) -> usize {
    use core::fmt::Write;

    struct BufWriter<'a> {
        buf: &'a mut [u8],
        pos: usize,
    }

    impl Write for BufWriter<'_> {
        fn write_str(&mut self, s: &str) -> core::fmt::Result {
            let bytes = s.as_bytes();
            let remaining = self.buf.len() - self.pos;
            let to_write = bytes.len().min(remaining);
            self.buf[self.pos..self.pos + to_write].copy_from_slice(&bytes[..to_write]);
            self.pos += to_write;
            Ok(())
        }
    }

    let mut writer = BufWriter { buf, pos: 0 };
    let _ = core::fmt::write(&mut writer, args);
    writer.pos
}

/// Push a formatted message into [`DIAG_LOG`] without blocking.
#[macro_export]
macro_rules! diag_log {
    ($level:expr, $timestamp_ms:expr, $($arg:tt)*) => {{
        let mut buf = [0u8; $crate::logging::MAX_MSG_LEN];
        let len = $crate::logging::format_to_buffer(&mut buf, format_args!($($arg)*));
        $crate::logging::DIAG_LOG.push($timestamp_ms, $level, &buf[..len]);
    }};
}

#[macro_export]
macro_rules! diag_info {
    ($timestamp_ms:expr, $($arg:tt)*) => {
        $crate::diag_log!($crate::logging::LogLevel::Info, $timestamp_ms, $($arg)*)
    };
}

#[macro_export]
macro_rules! diag_warn {
    ($timestamp_ms:expr, $($arg:tt)*) => {
        $crate::diag_log!($crate::logging::LogLevel::Warn, $timestamp_ms, $($arg)*)
    };
}

#[macro_export]
macro_rules! diag_error {
    ($timestamp_ms:expr, $($arg:tt)*) => {
        $crate::diag_log!($crate::logging::LogLevel::Error, $timestamp_ms, $($arg)*)
    };
}

/// Render an entry as `[timestamp ms] LEVEL: message` plus newline.
///
/// Returns the number of bytes written into `buf`.
pub fn format_entry(entry: &LogEntry, buf: &mut [u8]) -> usize {
    let msg = core::str::from_utf8(&entry.msg[..entry.len as usize]).unwrap_or("<invalid utf8>");
    format_to_buffer(
        buf,
        format_args!(
            "[{:8} ms] {}: {}\r\n",
            entry.timestamp_ms,
            entry.level.as_str(),
            msg
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_then_drain() {
        let ring = LogRing::<16>::new();

        assert!(ring.push(1000, LogLevel::Info, b"session started"));
        assert_eq!(ring.pending(), 1);

        let entry = ring.drain().unwrap();
        assert_eq!(entry.timestamp_ms, 1000);
        assert_eq!(entry.level, LogLevel::Info);
        assert_eq!(&entry.msg[..entry.len as usize], b"session started");

        assert!(ring.drain().is_none());
    }

    #[test]
    fn full_ring_drops_then_recovers() {
        let ring = LogRing::<4>::new();

        for i in 0..4 {
            assert!(ring.push(i, LogLevel::Info, b"x"));
        }
        assert!(!ring.push(4, LogLevel::Info, b"overflow"));
        assert_eq!(ring.dropped(), 1);

        // Draining one frees a slot again.
        assert!(ring.drain().is_some());
        assert!(ring.push(5, LogLevel::Info, b"y"));

        ring.reset_dropped();
        assert_eq!(ring.dropped(), 0);
    }

    #[test]
    fn drain_order_is_fifo() {
        let ring = LogRing::<8>::new();
        ring.push(1, LogLevel::Warn, b"first");
        ring.push(2, LogLevel::Error, b"second");

        assert_eq!(ring.drain().unwrap().timestamp_ms, 1);
        assert_eq!(ring.drain().unwrap().timestamp_ms, 2);
    }

    #[test]
    fn format_to_buffer_truncates() {
        let mut buf = [0u8; 8];
        let len = format_to_buffer(&mut buf, format_args!("0123456789"));
        assert_eq!(len, 8);
        assert_eq!(&buf, b"01234567");
    }

    #[test]
    fn format_entry_layout() {
        let mut entry = LogEntry {
            timestamp_ms: 1234,
            level: LogLevel::Warn,
            len: 5,
            msg: [0; MAX_MSG_LEN],
        };
        entry.msg[..5].copy_from_slice(b"hello");

        let mut buf = [0u8; 160];
        let len = format_entry(&entry, &mut buf);
        let text = core::str::from_utf8(&buf[..len]).unwrap();
        assert!(text.contains("1234"));
        assert!(text.contains("WARN"));
        assert!(text.contains("hello"));
        assert!(text.ends_with("\r\n"));
    }

    #[test]
    fn concurrent_producers_keep_all_messages() {
        use std::sync::Arc;
        use std::thread;

        let ring = Arc::new(LogRing::<256>::new());
        let mut handles = vec![];

        for i in 0..4 {
            let ring = Arc::clone(&ring);
            handles.push(thread::spawn(move || {
                for j in 0..20 {
                    let msg = format!("t{} m{}", i, j);
                    assert!(ring.push(j as i64, LogLevel::Info, msg.as_bytes()));
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        let mut count = 0;
        while ring.drain().is_some() {
            count += 1;
        }
        assert_eq!(count, 80);
    }

    #[test]
    fn diag_macros_reach_the_global_ring() {
        while DIAG_LOG.drain().is_some() {}

        diag_info!(7, "spawned {}", "shell");
        let entry = DIAG_LOG.drain().unwrap();
        assert_eq!(entry.timestamp_ms, 7);
        assert_eq!(entry.level, LogLevel::Info);
        assert_eq!(&entry.msg[..entry.len as usize], b"spawned shell");
    }
}
