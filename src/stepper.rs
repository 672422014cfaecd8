//! Stepper phase sequencing.
//!
//! Half-step drive of a 4-phase motor: adjacent windings overlap for one
//! step out of two, which hands torque over more smoothly than full-step
//! drive. The sequencer is a periodic task object: one [`StepSequencer::tick`]
//! per period applies exactly one duty change to exactly one winding; the
//! inter-step suspension belongs to the task loop that owns it.
//!
//! The PWM peripheral is written by this sequencer alone (single writer,
//! no locking). There is no stop, pause, reverse, or failure path.

use crate::config::{PWM_MAX_DUTY, STEP_INTERVAL_MS};

/// One motor winding, bound 1:1 to a PWM channel at startup.
///
/// Harness wire colors: A = blue, B = pink, C = yellow, D = orange.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    A,
    B,
    C,
    D,
}

impl Phase {
    pub const COUNT: usize = 4;

    /// PWM channel index this winding is wired to.
    pub fn channel(self) -> usize {
        match self {
            Phase::A => 0,
            Phase::B => 1,
            Phase::C => 2,
            Phase::D => 3,
        }
    }
}

/// Duty level applied by a transition. Half-step drive only ever uses
/// the two extremes; no microstepping duty is produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    Off,
    On,
}

impl Level {
    pub fn duty(self) -> u32 {
        match self {
            Level::Off => 0,
            Level::On => PWM_MAX_DUTY,
        }
    }
}

/// A single energization change: exactly one phase toggled on or off.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transition {
    pub phase: Phase,
    pub level: Level,
}

const fn on(phase: Phase) -> Transition {
    Transition {
        phase,
        level: Level::On,
    }
}

const fn off(phase: Phase) -> Transition {
    Transition {
        phase,
        level: Level::Off,
    }
}

/// Transitions per full electrical cycle.
pub const STEPS_PER_CYCLE: usize = 8;

/// Steady-state half-step cycle. Starting from phase D alone energized,
/// each entry keeps the energized-winding count at one or two, including
/// across the wrap from the last entry back to the first.
pub const HALF_STEP_CYCLE: [Transition; STEPS_PER_CYCLE] = [
    on(Phase::C),
    off(Phase::D),
    on(Phase::B),
    off(Phase::C),
    on(Phase::A),
    off(Phase::B),
    on(Phase::D),
    off(Phase::A),
];

/// First transition out of the all-off startup state, applied once
/// before entering [`HALF_STEP_CYCLE`].
pub const PRIME_STEP: Transition = on(Phase::D);

/// Sink of (channel, duty) writes.
///
/// On hardware this is the LEDC driver; tests substitute a recording
/// fake. Writes are infallible from the sequencer's point of view.
pub trait PwmSink {
    fn set_duty(&mut self, channel: usize, duty: u32);
}

/// The half-step sequencer.
///
/// Started once at boot and expected to run forever; there is no
/// external API beyond construction and `tick`.
pub struct StepSequencer<P: PwmSink> {
    pwm: P,
    cursor: usize,
    primed: bool,
    period_ms: u32,
}

impl<P: PwmSink> StepSequencer<P> {
    /// Takes sole ownership of the PWM sink and drives all four
    /// channels to zero duty (all phases off).
    pub fn new(pwm: P) -> Self {
        Self::with_period_ms(pwm, STEP_INTERVAL_MS)
    }

    /// Same as [`StepSequencer::new`] with an explicit inter-step
    /// period.
    pub fn with_period_ms(mut pwm: P, period_ms: u32) -> Self {
        for channel in 0..Phase::COUNT {
            pwm.set_duty(channel, 0);
        }
        Self {
            pwm,
            cursor: 0,
            primed: false,
            period_ms,
        }
    }

    /// Inter-step interval in milliseconds. The owning task loop must
    /// suspend for this long between ticks; two transitions are never
    /// applied without the intervening delay.
    pub fn period_ms(&self) -> u32 {
        self.period_ms
    }

    /// Apply the next transition and advance. Infallible and unending:
    /// the first call applies [`PRIME_STEP`], every later call walks
    /// [`HALF_STEP_CYCLE`] in order, wrapping after the last entry.
    pub fn tick(&mut self) -> Transition {
        let transition = if self.primed {
            let t = HALF_STEP_CYCLE[self.cursor];
            self.cursor = (self.cursor + 1) % STEPS_PER_CYCLE;
            t
        } else {
            self.primed = true;
            PRIME_STEP
        };

        self.pwm
            .set_duty(transition.phase.channel(), transition.level.duty());
        transition
    }

    /// Access to the owned sink.
    pub fn sink(&self) -> &P {
        &self.pwm
    }
}
