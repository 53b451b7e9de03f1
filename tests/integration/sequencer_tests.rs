//! Sequencer timelines against the virtual clock.
//!
//! With `fast_config()` a start that never sees the running signal looks like:
//!
//! ```text
//!   0  power on          50  crank 1 (50..80)   monitor 80..180   retry 180..230
//!  20  choke on         230  crank 2 (230..260) monitor 260..360  retry 360..410
//!                       410  crank 3 (410..440) monitor 440..540  -> timeout
//! ```

use genctl::adapters::mode::SharedMode;
use genctl::app::events::AppEvent;
use genctl::error::StartFailure;
use genctl::fsm::sequencer::GeneratorSequencer;
use genctl::fsm::{GeneratorState, OutputLine};
use genctl::mode::OperatingMode;

use crate::mock_hw::{MockBoard, MockDelay, RecordingSink, SimClock, Trigger, fast_config};

type Sequencer = GeneratorSequencer<MockBoard, MockDelay, SharedMode>;

fn sequencer(clock: &SimClock, board: MockBoard, mode: &SharedMode) -> Sequencer {
    GeneratorSequencer::new(fast_config(), board, MockDelay::new(clock), mode.clone())
}

#[test]
fn already_running_generator_is_never_cranked() {
    let clock = SimClock::new();
    let mode = SharedMode::new(OperatingMode::Auto);
    let mut seq = sequencer(&clock, MockBoard::running_from(&clock, 0), &mode);
    let mut sink = RecordingSink::new();

    assert!(seq.start(&mut sink));
    assert_eq!(seq.state(), GeneratorState::Running);
    assert!(!seq.io().ever_energized(OutputLine::Starter));
    assert!(seq.io().writes.is_empty());
    assert_eq!(clock.now(), 0);
    assert!(sink.contains(&AppEvent::RunningDetected));
}

#[test]
fn dead_generator_fails_after_three_cranks_with_everything_off() {
    let clock = SimClock::new();
    let mode = SharedMode::new(OperatingMode::Auto);
    let mut seq = sequencer(&clock, MockBoard::dead(&clock), &mode);
    let mut sink = RecordingSink::new();

    assert!(!seq.start(&mut sink));
    assert_eq!(seq.state(), GeneratorState::Off);
    assert_eq!(seq.start_attempts(), 1);
    assert_eq!(seq.last_failure(), Some(StartFailure::StartTimeout));
    assert!(seq.io().levels.engine_safe());
    assert!(seq.outputs().engine_safe());

    assert_eq!(seq.io().pulses(OutputLine::Starter), 3);
    assert_eq!(seq.io().first_on(OutputLine::Power), Some(0));
    assert_eq!(seq.io().first_on(OutputLine::Choke), Some(20));
    assert_eq!(seq.io().first_on(OutputLine::Starter), Some(50));
    assert_eq!(clock.now(), 540);
}

#[test]
fn outer_budget_exhausts_and_resets() {
    let clock = SimClock::new();
    let mode = SharedMode::new(OperatingMode::Auto);
    let mut seq = sequencer(&clock, MockBoard::dead(&clock), &mode);
    let mut sink = RecordingSink::new();

    assert!(!seq.start(&mut sink));
    assert_eq!(seq.start_attempts(), 1);
    assert!(!seq.start(&mut sink));
    assert_eq!(seq.start_attempts(), 2);
    assert!(!seq.start(&mut sink));

    assert_eq!(seq.state(), GeneratorState::Off);
    assert_eq!(seq.start_attempts(), 0);
    assert_eq!(
        seq.last_failure(),
        Some(StartFailure::StartAttemptsExhausted)
    );
    assert_eq!(seq.io().pulses(OutputLine::Starter), 9);
    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::StartAttempt { .. })),
        3
    );
}

#[test]
fn mode_change_during_choke_wait_aborts() {
    let clock = SimClock::new();
    let mode = SharedMode::new(OperatingMode::Auto);
    let mut seq = sequencer(&clock, MockBoard::dead(&clock), &mode);
    let mut sink = RecordingSink::new();
    clock.at(35, Trigger::SetMode(mode.clone(), OperatingMode::Manual));

    assert!(!seq.start(&mut sink));
    assert_eq!(seq.state(), GeneratorState::Off);
    assert_eq!(seq.last_failure(), Some(StartFailure::AbortedByModeChange));
    assert_eq!(seq.current_mode(), OperatingMode::Manual);
    assert!(seq.io().levels.engine_safe());
    assert!(!seq.io().ever_energized(OutputLine::Starter));
    // Noticed at the first check after the change.
    assert_eq!(clock.now(), 40);
}

#[test]
fn running_during_second_monitor_window_succeeds() {
    let clock = SimClock::new();
    let mode = SharedMode::new(OperatingMode::Auto);
    let mut seq = sequencer(&clock, MockBoard::running_from(&clock, 300), &mode);
    let mut sink = RecordingSink::new();

    assert!(seq.start(&mut sink));
    assert_eq!(seq.state(), GeneratorState::Running);
    assert_eq!(seq.io().pulses(OutputLine::Starter), 2);

    let outputs = seq.outputs();
    assert!(outputs.power);
    assert!(!outputs.choke, "choke is released after warm-up");
    assert!(!outputs.starter);
    assert!(!outputs.transfer_switch);

    // Detected at 300, choke off at 330, warm-up done at 380.
    let choke_off = seq
        .io()
        .writes
        .iter()
        .rev()
        .find(|w| w.line == OutputLine::Choke && !w.energized)
        .map(|w| w.at_ms);
    assert_eq!(choke_off, Some(330));
    assert_eq!(clock.now(), 380);
    assert_eq!(sink.count(|e| matches!(e, AppEvent::Cranking { .. })), 2);
    assert!(sink.contains(&AppEvent::ChokeReleased));
}

#[test]
fn abort_is_honoured_within_one_check_interval() {
    let clock = SimClock::new();
    let mode = SharedMode::new(OperatingMode::Auto);
    let mut seq = sequencer(&clock, MockBoard::dead(&clock), &mode);
    let mut sink = RecordingSink::new();
    clock.at(10, Trigger::Abort(seq.abort_handle()));

    assert!(!seq.start(&mut sink));
    assert!(clock.now() <= 20, "returned at {} ms", clock.now());
    assert_eq!(seq.state(), GeneratorState::Off);
    assert_eq!(seq.last_failure(), Some(StartFailure::AbortedExplicit));
    assert!(seq.io().levels.engine_safe());
}

#[test]
fn abort_during_monitor_window_releases_the_engine() {
    let clock = SimClock::new();
    let mode = SharedMode::new(OperatingMode::Auto);
    let mut seq = sequencer(&clock, MockBoard::dead(&clock), &mode);
    let mut sink = RecordingSink::new();
    clock.at(120, Trigger::Abort(seq.abort_handle()));

    assert!(!seq.start(&mut sink));
    assert_eq!(clock.now(), 120);
    assert_eq!(seq.io().pulses(OutputLine::Starter), 1);
    assert!(seq.io().levels.engine_safe());
}

#[test]
fn stop_is_idempotent() {
    let clock = SimClock::new();
    let mode = SharedMode::new(OperatingMode::Manual);
    let mut seq = sequencer(&clock, MockBoard::running_from(&clock, 0), &mode);
    let mut sink = RecordingSink::new();

    assert!(seq.start(&mut sink));
    seq.set_transfer_switch(true, &mut sink);

    seq.stop(&mut sink);
    let after_first = seq.status();
    seq.stop(&mut sink);

    assert_eq!(seq.status(), after_first);
    assert_eq!(after_first.state, GeneratorState::Off);
    assert_eq!(after_first.start_attempts, 0);
    assert!(!after_first.transfer_switch_engaged);
    assert!(seq.io().levels.engine_safe());
    assert!(!seq.io().levels.transfer_switch);
}

#[test]
fn stop_releases_transfer_before_engine_lines() {
    let clock = SimClock::new();
    let mode = SharedMode::new(OperatingMode::Manual);
    let mut seq = sequencer(&clock, MockBoard::running_from(&clock, 0), &mode);
    let mut sink = RecordingSink::new();

    assert!(seq.start(&mut sink));
    seq.set_transfer_switch(true, &mut sink);
    let before = seq.io().writes.len();
    seq.stop(&mut sink);

    let order: Vec<OutputLine> = seq.io().writes[before..].iter().map(|w| w.line).collect();
    assert_eq!(order.first(), Some(&OutputLine::TransferSwitch));
    assert_eq!(order.last(), Some(&OutputLine::Power));
}

#[test]
fn success_keeps_the_attempt_count() {
    let clock = SimClock::new();
    let mode = SharedMode::new(OperatingMode::Auto);
    let mut seq = sequencer(&clock, MockBoard::running_from(&clock, 600), &mode);
    let mut sink = RecordingSink::new();

    // First start times out at 540, the second catches the engine after one crank.
    assert!(!seq.start(&mut sink));
    assert!(seq.start(&mut sink));
    assert_eq!(seq.start_attempts(), 2);
    assert_eq!(seq.last_failure(), None);
}

#[test]
fn running_after_choke_engage_skips_cranking() {
    let clock = SimClock::new();
    let mode = SharedMode::new(OperatingMode::Auto);
    let mut seq = sequencer(&clock, MockBoard::running_from(&clock, 35), &mode);
    let mut sink = RecordingSink::new();

    assert!(seq.start(&mut sink));
    assert_eq!(seq.state(), GeneratorState::Running);
    assert_eq!(seq.io().pulses(OutputLine::Starter), 0);
    assert_eq!(sink.count(|e| matches!(e, AppEvent::Cranking { .. })), 0);

    // Seen at 50 after choke engage, choke off at 80, warm-up done at 130.
    let choke_off = seq
        .io()
        .writes
        .iter()
        .find(|w| w.line == OutputLine::Choke && !w.energized)
        .map(|w| w.at_ms);
    assert_eq!(choke_off, Some(80));
    assert!(!seq.outputs().choke);
    assert!(seq.outputs().power);
    assert_eq!(clock.now(), 130);
}

#[test]
fn mode_change_during_warm_up_releases_everything() {
    let clock = SimClock::new();
    let mode = SharedMode::new(OperatingMode::Auto);
    let mut seq = sequencer(&clock, MockBoard::running_from(&clock, 35), &mode);
    let mut sink = RecordingSink::new();
    clock.at(90, Trigger::SetMode(mode.clone(), OperatingMode::Off));

    assert!(!seq.start(&mut sink));
    assert_eq!(clock.now(), 90);
    assert_eq!(seq.state(), GeneratorState::Off);
    assert_eq!(seq.last_failure(), Some(StartFailure::AbortedByModeChange));
    assert!(seq.io().levels.engine_safe());
    assert!(!sink.contains(&AppEvent::StateChanged {
        from: GeneratorState::Starting,
        to: GeneratorState::Running,
    }));
}

#[test]
fn engine_left_spinning_after_abort_is_adopted_without_power() {
    let clock = SimClock::new();
    let mode = SharedMode::new(OperatingMode::Auto);
    let mut seq = sequencer(&clock, MockBoard::running_from(&clock, 30), &mode);
    let mut sink = RecordingSink::new();
    // Lands in the choke warm-up (50..80).
    clock.at(60, Trigger::Abort(seq.abort_handle()));

    assert!(!seq.start(&mut sink));
    assert_eq!(clock.now(), 60);
    assert_eq!(seq.last_failure(), Some(StartFailure::AbortedExplicit));
    assert!(seq.io().levels.engine_safe());

    // The running signal is still asserted, so the next start adopts it as is.
    let writes = seq.io().writes.len();
    assert!(seq.start(&mut sink));
    assert_eq!(seq.state(), GeneratorState::Running);
    assert!(!seq.io().levels.power);
    assert_eq!(seq.io().writes.len(), writes);
    assert_eq!(seq.start_attempts(), 2);
}

#[test]
fn drift_at_end_of_monitor_window_skips_the_retry_delay() {
    let clock = SimClock::new();
    let mode = SharedMode::new(OperatingMode::Auto);
    let mut seq = sequencer(&clock, MockBoard::dead(&clock), &mode);
    let mut sink = RecordingSink::new();
    // Last increment of the first monitor window (80..180).
    clock.at(175, Trigger::SetMode(mode.clone(), OperatingMode::Manual));

    assert!(!seq.start(&mut sink));
    assert_eq!(clock.now(), 180, "no retry delay after drift");
    assert_eq!(seq.io().pulses(OutputLine::Starter), 1);
    assert_eq!(seq.last_failure(), Some(StartFailure::AbortedByModeChange));
    assert!(seq.io().levels.engine_safe());
}
