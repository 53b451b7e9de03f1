//! Integration tests for the AppService → sequencer → relays pipeline.
//!
//! These run on the host (x86_64) and drive the service the way the main
//! loop does: one `tick` per sample with the grid level, plus commands.

use genctl::adapters::mode::SharedMode;
use genctl::app::commands::AppCommand;
use genctl::app::events::AppEvent;
use genctl::app::service::AppService;
use genctl::error::{Error, StartFailure};
use genctl::fsm::{GeneratorState, OutputLine};
use genctl::mode::OperatingMode;

use crate::mock_hw::{MockBoard, MockDelay, RecordingSink, SimClock, Trigger, fast_config};

type App = AppService<MockBoard, MockDelay>;

fn make_app(clock: &SimClock, board: MockBoard, mode: OperatingMode) -> (App, SharedMode) {
    let cell = SharedMode::new(mode);
    let app = AppService::with_mode(fast_config(), board, MockDelay::new(clock), cell.clone());
    (app, cell)
}

// ── Manual start + load transfer ─────────────────────────────

#[test]
fn start_command_transfers_load_after_delay() {
    let clock = SimClock::new();
    let (mut app, _) = make_app(&clock, MockBoard::running_from(&clock, 0), OperatingMode::Manual);
    let mut sink = RecordingSink::new();

    app.handle_command(AppCommand::StartGenerator, &mut sink)
        .expect("start should succeed");

    assert_eq!(app.state(), GeneratorState::Running);
    assert!(app.status().transfer_switch_engaged);
    // 60 ms manual prep, then 40 ms transfer delay.
    assert_eq!(
        app.sequencer().io().first_on(OutputLine::TransferSwitch),
        Some(100)
    );
    assert!(sink.contains(&AppEvent::TransferSwitch { engaged: true }));
}

#[test]
fn auto_start_command_skips_the_prep_delay() {
    let clock = SimClock::new();
    let (mut app, _) = make_app(&clock, MockBoard::running_from(&clock, 0), OperatingMode::Auto);
    let mut sink = RecordingSink::new();

    app.handle_command(AppCommand::StartGenerator, &mut sink).unwrap();

    assert_eq!(
        app.sequencer().io().first_on(OutputLine::TransferSwitch),
        Some(40)
    );
}

// ── Manual start prep window ─────────────────────────────────

#[test]
fn manual_start_waits_out_the_prep_delay() {
    let clock = SimClock::new();
    let (mut app, _) = make_app(&clock, MockBoard::running_from(&clock, 90), OperatingMode::Manual);
    let mut sink = RecordingSink::new();

    app.handle_command(AppCommand::StartGenerator, &mut sink).unwrap();

    let io = app.sequencer().io();
    assert_eq!(io.first_on(OutputLine::Power), Some(60));
    assert_eq!(io.first_on(OutputLine::Choke), Some(80));
    assert!(!io.ever_energized(OutputLine::Starter));
    // Running at 110, warm-up to 190, transfer at 230.
    assert_eq!(io.first_on(OutputLine::TransferSwitch), Some(230));
    assert_eq!(app.state(), GeneratorState::Running);
}

#[test]
fn mode_change_during_manual_prep_cancels_before_any_output() {
    let clock = SimClock::new();
    let (mut app, cell) = make_app(&clock, MockBoard::dead(&clock), OperatingMode::Manual);
    let mut sink = RecordingSink::new();
    clock.at(30, Trigger::SetMode(cell, OperatingMode::Auto));

    let result = app.handle_command(AppCommand::StartGenerator, &mut sink);

    assert!(matches!(
        result,
        Err(Error::Start(StartFailure::AbortedByModeChange))
    ));
    assert_eq!(clock.now(), 30);
    assert!(app.sequencer().io().writes.is_empty());
    assert_eq!(app.status().start_attempts, 0);
    assert_eq!(app.state(), GeneratorState::Off);
    assert!(sink.contains(&AppEvent::StartFailed(StartFailure::AbortedByModeChange)));
}

#[test]
fn abort_during_manual_prep_cancels_the_start() {
    let clock = SimClock::new();
    let (mut app, _) = make_app(&clock, MockBoard::running_from(&clock, 0), OperatingMode::Manual);
    let mut sink = RecordingSink::new();
    clock.at(20, Trigger::Abort(app.abort_handle()));

    let result = app.handle_command(AppCommand::StartGenerator, &mut sink);

    assert!(matches!(
        result,
        Err(Error::Start(StartFailure::AbortedExplicit))
    ));
    assert_eq!(clock.now(), 20);
    assert!(app.sequencer().io().writes.is_empty());
    assert_eq!(app.state(), GeneratorState::Off);
}

#[test]
fn start_while_running_is_a_no_op() {
    let clock = SimClock::new();
    let (mut app, _) = make_app(&clock, MockBoard::running_from(&clock, 0), OperatingMode::Manual);
    let mut sink = RecordingSink::new();

    app.handle_command(AppCommand::StartGenerator, &mut sink).unwrap();
    let writes = app.sequencer().io().writes.len();
    app.handle_command(AppCommand::StartGenerator, &mut sink).unwrap();

    assert_eq!(app.sequencer().io().writes.len(), writes);
    assert_eq!(app.status().start_attempts, 1);
}

#[test]
fn mode_change_during_transfer_delay_cancels_transfer() {
    let clock = SimClock::new();
    let (mut app, cell) = make_app(&clock, MockBoard::running_from(&clock, 0), OperatingMode::Manual);
    let mut sink = RecordingSink::new();
    // Prep ends at 60; the transfer delay runs 60..100.
    clock.at(80, Trigger::SetMode(cell, OperatingMode::Auto));

    let result = app.handle_command(AppCommand::StartGenerator, &mut sink);

    assert!(matches!(
        result,
        Err(Error::Start(StartFailure::AbortedByModeChange))
    ));
    assert_eq!(clock.now(), 80);
    assert_eq!(app.status().start_attempts, 0);
    assert_eq!(app.state(), GeneratorState::Off);
    assert!(!app.sequencer().io().ever_energized(OutputLine::TransferSwitch));
}

#[test]
fn failed_start_reports_the_reason() {
    let clock = SimClock::new();
    let (mut app, _) = make_app(&clock, MockBoard::dead(&clock), OperatingMode::Manual);
    let mut sink = RecordingSink::new();

    let result = app.handle_command(AppCommand::StartGenerator, &mut sink);

    assert!(matches!(result, Err(Error::Start(StartFailure::StartTimeout))));
    assert!(sink.contains(&AppEvent::StartFailed(StartFailure::StartTimeout)));
    assert_eq!(app.state(), GeneratorState::Off);
}

// ── AUTO mode and the grid ───────────────────────────────────

#[test]
fn auto_mode_starts_on_outage_and_stops_on_restore() {
    let clock = SimClock::new();
    let (mut app, _) = make_app(&clock, MockBoard::running_from(&clock, 140), OperatingMode::Auto);
    let mut sink = RecordingSink::new();

    // Grid drops at 0, confirmed at 100.
    app.tick(clock.now(), false, &mut sink);
    assert_eq!(app.state(), GeneratorState::Off);
    clock.advance(100);
    app.tick(clock.now(), false, &mut sink);

    assert!(sink.contains(&AppEvent::GridOutage));
    assert!(!app.grid_ok());
    assert_eq!(app.state(), GeneratorState::Running);
    assert!(app.status().transfer_switch_engaged);
    assert_eq!(app.fault_flags(), 0);

    // Grid returns, confirmed 100 ms later.
    app.tick(clock.now(), true, &mut sink);
    clock.advance(100);
    app.tick(clock.now(), true, &mut sink);

    assert!(sink.contains(&AppEvent::GridRestored));
    assert!(app.grid_ok());
    assert_eq!(app.state(), GeneratorState::Off);
    let status = app.status();
    assert!(!status.transfer_switch_engaged);
    assert!(status.outputs.engine_safe());
    assert!(app.sequencer().io().levels.engine_safe());
}

#[test]
fn outage_in_manual_mode_does_not_start() {
    let clock = SimClock::new();
    let (mut app, _) = make_app(&clock, MockBoard::running_from(&clock, 0), OperatingMode::Manual);
    let mut sink = RecordingSink::new();

    app.tick(0, false, &mut sink);
    clock.advance(200);
    app.tick(clock.now(), false, &mut sink);

    assert!(sink.contains(&AppEvent::GridOutage));
    assert_eq!(app.state(), GeneratorState::Off);
    assert!(app.sequencer().io().writes.is_empty());
}

#[test]
fn auto_start_gives_up_after_the_budget() {
    let clock = SimClock::new();
    let (mut app, _) = make_app(&clock, MockBoard::dead(&clock), OperatingMode::Auto);
    let mut sink = RecordingSink::new();

    app.tick(0, false, &mut sink);
    clock.advance(100);
    for _ in 0..6 {
        app.tick(clock.now(), false, &mut sink);
        clock.advance(10);
    }

    // Three failed starts, then the pending request is dropped.
    assert_eq!(sink.count(|e| matches!(e, AppEvent::StartAttempt { .. })), 3);
    assert!(sink.contains(&AppEvent::StartFailed(
        StartFailure::StartAttemptsExhausted
    )));
    assert_eq!(app.state(), GeneratorState::Off);
    assert_eq!(app.status().start_attempts, 0);
}

// ── OFF mode ─────────────────────────────────────────────────

#[test]
fn off_mode_forces_a_running_generator_down() {
    let clock = SimClock::new();
    let (mut app, cell) = make_app(&clock, MockBoard::running_from(&clock, 0), OperatingMode::Manual);
    let mut sink = RecordingSink::new();

    app.handle_command(AppCommand::StartGenerator, &mut sink).unwrap();
    assert_eq!(app.state(), GeneratorState::Running);

    // Mode written straight to the cell, as an accessory bridge would.
    cell.set(OperatingMode::Off);
    app.tick(clock.now(), true, &mut sink);

    assert_eq!(app.state(), GeneratorState::Off);
    assert!(!app.status().transfer_switch_engaged);
    assert!(app.sequencer().io().levels.engine_safe());
}

#[test]
fn set_mode_off_command_stops_immediately() {
    let clock = SimClock::new();
    let (mut app, _) = make_app(&clock, MockBoard::running_from(&clock, 0), OperatingMode::Auto);
    let mut sink = RecordingSink::new();

    app.handle_command(AppCommand::StartGenerator, &mut sink).unwrap();
    app.handle_command(AppCommand::SetMode(OperatingMode::Off), &mut sink)
        .unwrap();

    assert_eq!(app.mode(), OperatingMode::Off);
    assert_eq!(app.state(), GeneratorState::Off);
    assert!(sink.contains(&AppEvent::ModeChanged {
        from: OperatingMode::Auto,
        to: OperatingMode::Off,
    }));
}

#[test]
fn start_rejected_in_off_mode() {
    let clock = SimClock::new();
    let (mut app, _) = make_app(&clock, MockBoard::running_from(&clock, 0), OperatingMode::Off);
    let mut sink = RecordingSink::new();

    let result = app.handle_command(AppCommand::StartGenerator, &mut sink);

    assert!(matches!(result, Err(Error::Rejected(_))));
    assert!(app.sequencer().io().writes.is_empty());
    assert!(sink.count(|e| matches!(e, AppEvent::CommandRejected(_))) == 1);
}
