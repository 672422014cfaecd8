//! Session supervisor tests

use std::cell::Cell;
use std::collections::VecDeque;
use std::rc::Rc;

use stepper_diag::supervisor::{
    PollEvent, SessionHandle, SessionSupervisor, ShellSpawner, SpawnError, SupervisorState,
    TaskState, TransportStatus,
};

#[derive(Clone)]
struct FakeTransport {
    active: Rc<Cell<bool>>,
}

impl FakeTransport {
    fn new() -> Self {
        Self {
            active: Rc::new(Cell::new(false)),
        }
    }
}

impl TransportStatus for FakeTransport {
    fn is_active(&self) -> bool {
        self.active.get()
    }
}

struct FakeHandle {
    terminated: Rc<Cell<bool>>,
    reclaims: Rc<Cell<usize>>,
}

impl SessionHandle for FakeHandle {
    fn state(&self) -> TaskState {
        if self.terminated.get() {
            TaskState::Terminated
        } else {
            TaskState::Running
        }
    }

    fn reclaim(self) {
        self.reclaims.set(self.reclaims.get() + 1);
    }
}

/// Hands out handles wired to shared termination/reclaim cells.
struct FakeSpawner {
    outcomes: VecDeque<Result<(), SpawnError>>,
    spawns: usize,
    terminated: Rc<Cell<bool>>,
    reclaims: Rc<Cell<usize>>,
}

impl FakeSpawner {
    fn new() -> Self {
        Self {
            outcomes: VecDeque::new(),
            spawns: 0,
            terminated: Rc::new(Cell::new(false)),
            reclaims: Rc::new(Cell::new(0)),
        }
    }

    fn fail_next(&mut self) {
        self.outcomes.push_back(Err(SpawnError::OutOfMemory));
    }
}

impl ShellSpawner for &mut FakeSpawner {
    type Handle = FakeHandle;

    fn spawn_session(&mut self) -> Result<FakeHandle, SpawnError> {
        if let Some(Err(e)) = self.outcomes.pop_front() {
            return Err(e);
        }
        self.spawns += 1;
        self.terminated.set(false);
        Ok(FakeHandle {
            terminated: Rc::clone(&self.terminated),
            reclaims: Rc::clone(&self.reclaims),
        })
    }
}

#[test]
fn stays_idle_while_transport_inactive() {
    let transport = FakeTransport::new();
    let mut spawner = FakeSpawner::new();
    let mut supervisor = SessionSupervisor::new(transport.clone(), &mut spawner);

    for _ in 0..5 {
        assert_eq!(supervisor.poll(), PollEvent::Idle);
        assert_eq!(supervisor.state(), SupervisorState::NoSession);
    }
    drop(supervisor);
    assert_eq!(spawner.spawns, 0);
}

#[test]
fn session_starts_on_first_poll_after_activation() {
    let transport = FakeTransport::new();
    let mut spawner = FakeSpawner::new();
    let mut supervisor = SessionSupervisor::new(transport.clone(), &mut spawner);

    transport.active.set(true);
    assert_eq!(supervisor.poll(), PollEvent::SessionStarted);
    assert_eq!(supervisor.state(), SupervisorState::SessionActive);
}

#[test]
fn at_most_one_session_handle_is_held() {
    let transport = FakeTransport::new();
    let mut spawner = FakeSpawner::new();
    let mut supervisor = SessionSupervisor::new(transport.clone(), &mut spawner);

    transport.active.set(true);
    supervisor.poll();
    for _ in 0..10 {
        assert_eq!(supervisor.poll(), PollEvent::Idle);
    }
    drop(supervisor);
    assert_eq!(spawner.spawns, 1);
}

#[test]
fn spawn_failure_leaves_no_session_and_retries() {
    let transport = FakeTransport::new();
    let mut spawner = FakeSpawner::new();
    spawner.fail_next();
    let mut supervisor = SessionSupervisor::new(transport.clone(), &mut spawner);

    transport.active.set(true);
    assert_eq!(supervisor.poll(), PollEvent::SpawnFailed);
    assert_eq!(supervisor.state(), SupervisorState::NoSession);

    // Next poll succeeds; the poll cadence is the only backoff.
    assert_eq!(supervisor.poll(), PollEvent::SessionStarted);
    assert_eq!(supervisor.state(), SupervisorState::SessionActive);
}

#[test]
fn terminated_session_is_reclaimed_exactly_once() {
    let transport = FakeTransport::new();
    let mut spawner = FakeSpawner::new();
    let terminated = Rc::clone(&spawner.terminated);
    let reclaims = Rc::clone(&spawner.reclaims);
    let mut supervisor = SessionSupervisor::new(transport.clone(), &mut spawner);

    transport.active.set(true);
    supervisor.poll();

    terminated.set(true);
    assert_eq!(supervisor.poll(), PollEvent::SessionReclaimed);
    assert_eq!(supervisor.state(), SupervisorState::NoSession);
    assert_eq!(reclaims.get(), 1);
}

#[test]
fn running_session_is_never_reclaimed() {
    let transport = FakeTransport::new();
    let mut spawner = FakeSpawner::new();
    let reclaims = Rc::clone(&spawner.reclaims);
    let mut supervisor = SessionSupervisor::new(transport.clone(), &mut spawner);

    transport.active.set(true);
    supervisor.poll();
    for _ in 0..10 {
        supervisor.poll();
    }
    assert_eq!(reclaims.get(), 0);
}

#[test]
fn fresh_session_follows_a_reclaimed_one() {
    let transport = FakeTransport::new();
    let mut spawner = FakeSpawner::new();
    let terminated = Rc::clone(&spawner.terminated);
    let mut supervisor = SessionSupervisor::new(transport.clone(), &mut spawner);

    transport.active.set(true);
    assert_eq!(supervisor.poll(), PollEvent::SessionStarted);
    terminated.set(true);
    assert_eq!(supervisor.poll(), PollEvent::SessionReclaimed);
    assert_eq!(supervisor.poll(), PollEvent::SessionStarted);
    assert_eq!(supervisor.state(), SupervisorState::SessionActive);

    drop(supervisor);
    assert_eq!(spawner.spawns, 2);
}

#[test]
fn reclaim_happens_even_if_transport_went_inactive() {
    let transport = FakeTransport::new();
    let mut spawner = FakeSpawner::new();
    let terminated = Rc::clone(&spawner.terminated);
    let reclaims = Rc::clone(&spawner.reclaims);
    let mut supervisor = SessionSupervisor::new(transport.clone(), &mut spawner);

    transport.active.set(true);
    supervisor.poll();

    transport.active.set(false);
    terminated.set(true);
    assert_eq!(supervisor.poll(), PollEvent::SessionReclaimed);
    assert_eq!(reclaims.get(), 1);

    // No new session while the transport stays down.
    assert_eq!(supervisor.poll(), PollEvent::Idle);
    assert_eq!(supervisor.state(), SupervisorState::NoSession);
}

#[test]
fn poll_interval_defaults_to_half_a_second() {
    let transport = FakeTransport::new();
    let mut spawner = FakeSpawner::new();
    let supervisor = SessionSupervisor::new(transport.clone(), &mut spawner);
    assert_eq!(supervisor.poll_interval_ms(), 500);

    let mut spawner = FakeSpawner::new();
    let supervisor = SessionSupervisor::with_poll_ms(transport, &mut spawner, 50);
    assert_eq!(supervisor.poll_interval_ms(), 50);
}
