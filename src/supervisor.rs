//! Diagnostic session supervision.
//!
//! A two-state polling loop that binds the lifetime of the (at most one)
//! shell session task to the transport connection state. The supervisor
//! owns everything it touches — transport probe, spawner, outstanding
//! handle — so there is no ambient global state and no synchronization
//! on the handle.
//!
//! Every failure here is transient: a failed spawn leaves the state
//! machine in `NoSession` and the next poll retries. The poll interval
//! itself rate-limits those retries.

use crate::config::SUPERVISOR_POLL_MS;

/// Lifecycle of a spawned task handle as the supervisor observes it.
///
/// A handle is reclaimed at most once and only after it has been
/// observed `Terminated`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskState {
    Created,
    Running,
    Terminated,
    Reclaimed,
}

/// Task creation failure. Insufficient memory is the only cause the
/// scheduler reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpawnError {
    OutOfMemory,
}

/// Handle to a schedulable unit of execution.
///
/// `reclaim` consumes the handle, so double reclamation is unrepresentable.
pub trait SessionHandle {
    fn state(&self) -> TaskState;

    /// Release the task's resources. Callers must have observed
    /// [`TaskState::Terminated`] first.
    fn reclaim(self);
}

/// Creates shell session tasks bound to the transport stream and the
/// diagnostic command set.
pub trait ShellSpawner {
    type Handle: SessionHandle;

    fn spawn_session(&mut self) -> Result<Self::Handle, SpawnError>;
}

/// Boolean connection probe on the underlying transport.
pub trait TransportStatus {
    fn is_active(&self) -> bool;
}

/// Supervisor state as visible from outside.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SupervisorState {
    NoSession,
    SessionActive,
}

/// What a single poll step did. The caller logs these; the supervisor
/// itself stays free of I/O.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PollEvent {
    Idle,
    SessionStarted,
    SessionReclaimed,
    SpawnFailed,
}

/// Owns the transport probe, the session spawner, and at most one
/// outstanding session handle.
pub struct SessionSupervisor<T, S>
where
    T: TransportStatus,
    S: ShellSpawner,
{
    transport: T,
    spawner: S,
    session: Option<S::Handle>,
    poll_ms: u32,
}

impl<T, S> SessionSupervisor<T, S>
where
    T: TransportStatus,
    S: ShellSpawner,
{
    pub fn new(transport: T, spawner: S) -> Self {
        Self::with_poll_ms(transport, spawner, SUPERVISOR_POLL_MS)
    }

    /// Same as [`SessionSupervisor::new`] with an explicit poll period.
    pub fn with_poll_ms(transport: T, spawner: S, poll_ms: u32) -> Self {
        Self {
            transport,
            spawner,
            session: None,
            poll_ms,
        }
    }

    /// Poll cadence in milliseconds. The owning task loop suspends for
    /// this long between calls to [`SessionSupervisor::poll`].
    pub fn poll_interval_ms(&self) -> u32 {
        self.poll_ms
    }

    pub fn state(&self) -> SupervisorState {
        if self.session.is_some() {
            SupervisorState::SessionActive
        } else {
            SupervisorState::NoSession
        }
    }

    /// One step of the state machine.
    ///
    /// `NoSession`: if the transport reports active, spawn a session and
    /// hold its handle. Spawn failure stays in `NoSession`.
    ///
    /// `SessionActive`: if the held handle is observed `Terminated`,
    /// reclaim it exactly once and clear it. A transport drop with the
    /// session still running is not acted on here; the session exits on
    /// its own once its reads fail, and the next polls pick that up.
    pub fn poll(&mut self) -> PollEvent {
        match self.session.take() {
            None => {
                if !self.transport.is_active() {
                    return PollEvent::Idle;
                }
                match self.spawner.spawn_session() {
                    Ok(handle) => {
                        self.session = Some(handle);
                        PollEvent::SessionStarted
                    }
                    Err(SpawnError::OutOfMemory) => PollEvent::SpawnFailed,
                }
            }
            Some(handle) => {
                if handle.state() == TaskState::Terminated {
                    handle.reclaim();
                    PollEvent::SessionReclaimed
                } else {
                    self.session = Some(handle);
                    PollEvent::Idle
                }
            }
        }
    }
}
