//! Stepper sequencer tests

use stepper_diag::stepper::{
    Level, Phase, PwmSink, StepSequencer, HALF_STEP_CYCLE, PRIME_STEP, STEPS_PER_CYCLE,
};

/// Records every (channel, duty) write.
#[derive(Default)]
struct RecordingPwm {
    writes: Vec<(usize, u32)>,
}

impl PwmSink for RecordingPwm {
    fn set_duty(&mut self, channel: usize, duty: u32) {
        self.writes.push((channel, duty));
    }
}

#[test]
fn startup_drives_all_channels_off() {
    let seq = StepSequencer::new(RecordingPwm::default());

    let writes = &seq.sink().writes;
    assert_eq!(writes.len(), 4);
    for channel in 0..4 {
        assert!(writes.contains(&(channel, 0)), "channel {} not zeroed", channel);
    }
}

#[test]
fn first_tick_primes_phase_d() {
    let mut seq = StepSequencer::new(RecordingPwm::default());

    let t = seq.tick();
    assert_eq!(t, PRIME_STEP);
    assert_eq!(t.phase, Phase::D);
    assert_eq!(t.level, Level::On);
    assert_eq!(seq.sink().writes.last(), Some(&(3, 128)));
}

#[test]
fn steady_cycle_matches_transition_table() {
    let mut seq = StepSequencer::new(RecordingPwm::default());

    seq.tick(); // prime
    for expected in HALF_STEP_CYCLE {
        assert_eq!(seq.tick(), expected);
    }
}

#[test]
fn cycle_is_periodic() {
    let mut seq = StepSequencer::new(RecordingPwm::default());
    seq.tick(); // prime

    let first: Vec<_> = (0..STEPS_PER_CYCLE).map(|_| seq.tick()).collect();
    let second: Vec<_> = (0..STEPS_PER_CYCLE).map(|_| seq.tick()).collect();
    assert_eq!(first, second);
}

#[test]
fn exactly_one_phase_changes_per_tick() {
    let mut seq = StepSequencer::new(RecordingPwm::default());
    let baseline = seq.sink().writes.len();

    for i in 1..=50 {
        seq.tick();
        assert_eq!(seq.sink().writes.len(), baseline + i);
    }
}

#[test]
fn one_or_two_phases_energized_at_all_times() {
    let mut seq = StepSequencer::new(RecordingPwm::default());
    let mut energized = [false; 4];

    for step in 0..200 {
        let t = seq.tick();
        energized[t.phase.channel()] = t.level == Level::On;

        let count = energized.iter().filter(|on| **on).count();
        assert!(
            (1..=2).contains(&count),
            "step {}: {} phases energized",
            step,
            count
        );
    }
}

#[test]
fn duty_is_only_ever_off_or_full() {
    let mut seq = StepSequencer::new(RecordingPwm::default());
    for _ in 0..100 {
        seq.tick();
    }

    for (_, duty) in &seq.sink().writes {
        assert!(*duty == 0 || *duty == 128, "unexpected duty {}", duty);
    }
}

#[test]
fn table_covers_every_phase_both_ways() {
    for phase in [Phase::A, Phase::B, Phase::C, Phase::D] {
        for level in [Level::On, Level::Off] {
            assert_eq!(
                HALF_STEP_CYCLE
                    .iter()
                    .filter(|t| t.phase == phase && t.level == level)
                    .count(),
                1,
                "{:?} {:?} must appear exactly once per cycle",
                phase,
                level
            );
        }
    }
}

#[test]
fn step_period_defaults_to_one_millisecond() {
    let seq = StepSequencer::new(RecordingPwm::default());
    assert_eq!(seq.period_ms(), 1);

    let seq = StepSequencer::with_period_ms(RecordingPwm::default(), 5);
    assert_eq!(seq.period_ms(), 5);
}

#[test]
fn phase_channel_mapping_is_fixed() {
    assert_eq!(Phase::A.channel(), 0);
    assert_eq!(Phase::B.channel(), 1);
    assert_eq!(Phase::C.channel(), 2);
    assert_eq!(Phase::D.channel(), 3);
}
