//! FreeRTOS glue: task spawning, the shell session task, and the
//! scheduler introspection behind the diagnostic command set.
//!
//! Session handles map the supervisor's lifecycle onto FreeRTOS
//! semantics: the shell task raises a termination flag before deleting
//! itself, and the idle task frees its TCB, so `reclaim` only clears
//! the flag for the next session.

use core::ffi::c_void;
use core::ptr;
use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use esp_idf_svc::sys as esp_idf_sys;
use esp_idf_svc::sys::{EspError, TaskHandle_t};

use crate::config::{
    SELF_TEST_TASK_STACK, SHELL_TASK_PRIORITY, SHELL_TASK_STACK, STEPPER_TASK_PRIORITY,
    STEPPER_TASK_STACK,
};
use crate::shell::{
    Diagnostics, HeapStats, SelfTestReport, Session, SessionEvent, ThreadInfo, ThreadState,
};
use crate::stepper::StepSequencer;
use crate::supervisor::{SessionHandle, ShellSpawner, SpawnError, TaskState};

use super::pwm::LedcPwm;
use super::usb_serial::UsbSerial;
use super::{delay_ms, timestamp_ms};

/// FreeRTOS `tskNO_AFFINITY`.
const NO_AFFINITY: i32 = 0x7FFF_FFFF;

/// FreeRTOS `pdPASS`.
const PD_PASS: i32 = 1;

/// How long a shell read blocks before re-checking the connection.
const SHELL_READ_TIMEOUT_MS: u32 = 50;

fn create_task(
    entry: unsafe extern "C" fn(*mut c_void),
    name: &'static [u8],
    stack_bytes: u32,
    priority: u32,
) -> Result<TaskHandle_t, SpawnError> {
    let mut handle: TaskHandle_t = ptr::null_mut();
    let rc = unsafe {
        esp_idf_sys::xTaskCreatePinnedToCore(
            Some(entry),
            name.as_ptr().cast(),
            stack_bytes,
            ptr::null_mut(),
            priority,
            &mut handle,
            NO_AFFINITY,
        )
    };
    if rc != PD_PASS {
        // errCOULD_NOT_ALLOCATE_REQUIRED_MEMORY is the only failure.
        return Err(SpawnError::OutOfMemory);
    }
    Ok(handle)
}

// --- Stepper task ---

unsafe extern "C" fn stepper_task(_arg: *mut c_void) {
    // PWM was configured during boot; this task is the sole writer.
    let mut sequencer = StepSequencer::new(LedcPwm::writer());
    loop {
        sequencer.tick();
        delay_ms(sequencer.period_ms());
    }
}

/// Spawn the stepper sequencer at its elevated priority. The task runs
/// forever and its handle is never reclaimed.
pub fn spawn_stepper() -> Result<(), EspError> {
    create_task(
        stepper_task,
        b"stepper\0",
        STEPPER_TASK_STACK,
        STEPPER_TASK_PRIORITY,
    )
    .map(|_| ())
    .map_err(|_| EspError::from_infallible::<{ esp_idf_sys::ESP_ERR_NO_MEM }>())
}

// --- Shell session task ---

/// Raised by the shell task right before it deletes itself. Valid
/// because at most one session exists at a time.
static SHELL_DONE: AtomicBool = AtomicBool::new(false);

unsafe extern "C" fn shell_task(_arg: *mut c_void) {
    let mut io = UsbSerial::handle();
    let diag = EspDiagnostics;
    let mut session = Session::new();

    session.print_banner(&mut io);

    loop {
        match io.read_byte(SHELL_READ_TIMEOUT_MS) {
            Some(byte) => {
                if session.process_byte(byte, &diag, &mut io) == SessionEvent::Exit {
                    break;
                }
            }
            // Transport dropped while the session was live: exit so the
            // supervisor can reclaim us on its next poll.
            None if !io.is_connected() => break,
            None => {}
        }
    }

    crate::diag_info!(timestamp_ms(), "shell session ended");
    SHELL_DONE.store(true, Ordering::Release);
    unsafe { esp_idf_sys::vTaskDelete(ptr::null_mut()) };
}

/// Handle to the spawned shell task.
pub struct FreeRtosSessionHandle {
    _raw: TaskHandle_t,
}

impl SessionHandle for FreeRtosSessionHandle {
    fn state(&self) -> TaskState {
        if SHELL_DONE.load(Ordering::Acquire) {
            TaskState::Terminated
        } else {
            TaskState::Running
        }
    }

    fn reclaim(self) {
        // The TCB was freed by the idle task after self-deletion; only
        // the termination flag needs resetting.
        SHELL_DONE.store(false, Ordering::Release);
    }
}

/// Spawns shell session tasks bound to the USB transport.
pub struct EspShellSpawner(());

impl EspShellSpawner {
    pub fn new() -> Self {
        Self(())
    }
}

impl Default for EspShellSpawner {
    fn default() -> Self {
        Self::new()
    }
}

impl ShellSpawner for EspShellSpawner {
    type Handle = FreeRtosSessionHandle;

    fn spawn_session(&mut self) -> Result<Self::Handle, SpawnError> {
        SHELL_DONE.store(false, Ordering::Release);
        let raw = create_task(shell_task, b"shell\0", SHELL_TASK_STACK, SHELL_TASK_PRIORITY)?;
        Ok(FreeRtosSessionHandle { _raw: raw })
    }
}

// --- Diagnostics ---

/// Scheduler introspection over the ESP-IDF heap and task registry.
pub struct EspDiagnostics;

/// Upper bound on tasks reported by `threads`.
const MAX_TASKS: usize = 24;

#[allow(non_upper_case_globals)]
fn thread_state(state: esp_idf_sys::eTaskState) -> ThreadState {
    match state {
        esp_idf_sys::eTaskState_eRunning => ThreadState::Running,
        esp_idf_sys::eTaskState_eReady => ThreadState::Ready,
        esp_idf_sys::eTaskState_eBlocked => ThreadState::Blocked,
        esp_idf_sys::eTaskState_eSuspended => ThreadState::Suspended,
        esp_idf_sys::eTaskState_eDeleted => ThreadState::Deleted,
        _ => ThreadState::Invalid,
    }
}

impl Diagnostics for EspDiagnostics {
    fn heap_stats(&self) -> HeapStats {
        let mut info = esp_idf_sys::multi_heap_info_t::default();
        unsafe { esp_idf_sys::heap_caps_get_info(&mut info, esp_idf_sys::MALLOC_CAP_DEFAULT) };

        HeapStats {
            core_free: unsafe { esp_idf_sys::esp_get_free_heap_size() } as usize,
            fragments: info.free_blocks as usize,
            free_total: info.total_free_bytes as usize,
        }
    }

    fn for_each_thread(&self, visit: &mut dyn FnMut(ThreadInfo)) {
        // SAFETY: TaskStatus_t is plain old data; zeroed entries are
        // only read up to the count returned below.
        let mut statuses: [esp_idf_sys::TaskStatus_t; MAX_TASKS] = unsafe { core::mem::zeroed() };
        let count = unsafe {
            esp_idf_sys::uxTaskGetSystemState(
                statuses.as_mut_ptr(),
                MAX_TASKS as u32,
                ptr::null_mut(),
            )
        };

        for status in &statuses[..count as usize] {
            visit(ThreadInfo {
                address: status.xHandle as usize,
                stack_ptr: status.pxStackBase as usize,
                priority: status.uxCurrentPriority,
                // FreeRTOS keeps no per-task reference counts.
                refs: 0,
                state: thread_state(status.eCurrentState),
            });
        }
    }

    fn run_self_test(&self) -> Result<SelfTestReport, SpawnError> {
        run_self_test()
    }
}

// --- Built-in self-test ---

static SELF_TEST_DONE: AtomicBool = AtomicBool::new(false);
static SELF_TEST_PASSED: AtomicU32 = AtomicU32::new(0);
static SELF_TEST_FAILED: AtomicU32 = AtomicU32::new(0);

unsafe extern "C" fn self_test_task(_arg: *mut c_void) {
    let mut passed = 0u32;
    let mut failed = 0u32;

    // RAM pattern walk over a stack buffer.
    let mut buf = [0u8; 256];
    for pattern in [0x55u8, 0xAA, 0x00, 0xFF] {
        buf.fill(pattern);
        if buf.iter().all(|b| *b == pattern) {
            passed += 1;
        } else {
            failed += 1;
        }
    }

    // Timer monotonicity across a yield.
    let before = unsafe { esp_idf_sys::esp_timer_get_time() };
    delay_ms(1);
    let after = unsafe { esp_idf_sys::esp_timer_get_time() };
    if after > before {
        passed += 1;
    } else {
        failed += 1;
    }

    SELF_TEST_PASSED.store(passed, Ordering::Relaxed);
    SELF_TEST_FAILED.store(failed, Ordering::Relaxed);
    SELF_TEST_DONE.store(true, Ordering::Release);
    unsafe { esp_idf_sys::vTaskDelete(ptr::null_mut()) };
}

/// Spawn the self-test task at the caller's priority and block until it
/// completes. Fails without blocking when the task cannot be created.
fn run_self_test() -> Result<SelfTestReport, SpawnError> {
    SELF_TEST_DONE.store(false, Ordering::Release);

    let priority = unsafe { esp_idf_sys::uxTaskPriorityGet(ptr::null_mut()) };
    create_task(self_test_task, b"selftest\0", SELF_TEST_TASK_STACK, priority)?;

    while !SELF_TEST_DONE.load(Ordering::Acquire) {
        delay_ms(10);
    }

    Ok(SelfTestReport {
        passed: SELF_TEST_PASSED.load(Ordering::Relaxed),
        failed: SELF_TEST_FAILED.load(Ordering::Relaxed),
    })
}
