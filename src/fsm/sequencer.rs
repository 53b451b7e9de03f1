//! Generator start/stop sequencer.
//!
//! Drives the power, choke and starter relays through a strict timed order,
//! watches the running signal, and retries within two budgets:
//!
//! - an **inner** budget of [`CRANKS_PER_START`] crank attempts per `start()`,
//! - an **outer** budget of `max_start_attempts` calls to `start()`.
//!
//! ```text
//!  power on ─▶ stabilize ─▶ choke on ─▶ engage ─┬─ running? ─▶ warm-up ─▶ RUNNING
//!                                               │
//!                                               └─▶ crank ─▶ monitor ─┬─ running ─▶ warm-up ─▶ RUNNING
//!                                                    ▲                │
//!                                                    └─── retry ◀─────┘ (x3, then fail)
//!
//!  warm-up = wait choke_warmup ─▶ choke off ─▶ wait post_choke_warmup
//! ```
//!
//! Every wait except the fixed crank duration is interruptible through
//! [`ModeWatch`]: an abort request or a change of operating mode since the
//! sequence began cancels it within one check interval.  Every failure path
//! de-energizes all lines before `start()` returns.

use embedded_hal::delay::DelayNs;
use log::{error, info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::{EventSink, GeneratorIo, ModeSource};
use crate::config::SystemConfig;
use crate::drivers::transfer_switch::TransferSwitch;
use crate::error::StartFailure;
use crate::mode::OperatingMode;

use super::watch::{AbortHandle, Cancelled, ModeWatch};
use super::{GeneratorState, OutputLevels, OutputLine};

/// Crank attempts within a single `start()` call.
pub const CRANKS_PER_START: u8 = 3;

/// Point-in-time view of the sequencer for bridges and telemetry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequencerStatus {
    pub state: GeneratorState,
    pub start_attempts: u8,
    pub current_mode: OperatingMode,
    pub transfer_switch_engaged: bool,
    pub outputs: OutputLevels,
    pub last_failure: Option<StartFailure>,
}

/// The generator lifecycle owner.  Constructed once at boot in `Off`.
pub struct GeneratorSequencer<H, D, M> {
    config: SystemConfig,
    io: H,
    delay: D,
    mode: M,
    watch: ModeWatch,
    transfer: TransferSwitch,

    state: GeneratorState,
    start_attempts: u8,
    current_mode: OperatingMode,
    outputs: OutputLevels,
    last_failure: Option<StartFailure>,
}

impl<H, D, M> GeneratorSequencer<H, D, M>
where
    H: GeneratorIo,
    D: DelayNs,
    M: ModeSource,
{
    pub fn new(config: SystemConfig, io: H, delay: D, mode: M) -> Self {
        let watch = ModeWatch::new(AbortHandle::new(), config.mode_change_check_interval_ms);
        let current_mode = mode.read();
        Self {
            config,
            io,
            delay,
            mode,
            watch,
            transfer: TransferSwitch::new(),
            state: GeneratorState::Off,
            start_attempts: 0,
            current_mode,
            outputs: OutputLevels::all_off(),
            last_failure: None,
        }
    }

    /// Rebind the mode source and refresh the observed mode.
    pub fn set_mode_source(&mut self, mode: M) {
        self.mode = mode;
        self.current_mode = self.mode.read();
    }

    // ── Public operations ─────────────────────────────────────

    /// Run one outer start attempt.  Blocks for the whole sequence.
    ///
    /// Returns `true` once the generator is `Running`.
    pub fn start(&mut self, sink: &mut impl EventSink) -> bool {
        self.current_mode = self.mode.read();

        if self.start_attempts >= self.config.max_start_attempts {
            warn!(
                "Start refused: {}/{} attempts already used",
                self.start_attempts, self.config.max_start_attempts
            );
            self.stop(sink);
            self.record_failure(StartFailure::StartAttemptsExhausted, sink);
            return false;
        }

        self.transition(GeneratorState::Starting, sink);
        self.start_attempts += 1;
        info!(
            "Start attempt {}/{} (mode {})",
            self.start_attempts, self.config.max_start_attempts, self.current_mode
        );
        sink.emit(&AppEvent::StartAttempt {
            attempt: self.start_attempts,
            max: self.config.max_start_attempts,
        });

        // Clear stale aborts and fix the cancellation baseline for this sequence.
        self.watch.arm(self.current_mode);

        if self.io.running_signal() {
            info!("Generator already running, skipping start sequence");
            sink.emit(&AppEvent::RunningDetected);
            return self.mark_running(sink);
        }

        match self.run_start_sequence(sink) {
            Ok(()) => self.mark_running(sink),
            Err(failure) => {
                error!("Start sequence failed: {failure}");
                self.release_all(sink);
                self.record_failure(failure, sink);
                if self.start_attempts >= self.config.max_start_attempts {
                    error!(
                        "All {} start attempts used, resetting",
                        self.config.max_start_attempts
                    );
                    self.stop(sink);
                    self.record_failure(StartFailure::StartAttemptsExhausted, sink);
                }
                false
            }
        }
    }

    /// De-energize every line, return to `Off`, and reset the attempt budget.
    /// Idempotent.
    pub fn stop(&mut self, sink: &mut impl EventSink) {
        self.release_all(sink);
        self.start_attempts = 0;
    }

    /// Request cancellation of the in-flight sequence.  Has no effect on
    /// actuators by itself; the sequence notices within one check interval.
    pub fn abort(&self) {
        info!("Abort requested");
        self.watch.abort_handle().request();
    }

    /// Handle for requesting an abort from another thread.
    pub fn abort_handle(&self) -> AbortHandle {
        self.watch.abort_handle().clone()
    }

    /// Command the transfer switch.  No interlock with `state` is enforced.
    pub fn set_transfer_switch(&mut self, enable: bool, sink: &mut impl EventSink) {
        if enable && self.state != GeneratorState::Running {
            warn!(
                "Transfer switch engaged while generator is {}",
                self.state.name()
            );
        }
        self.transfer.set(&mut self.io, enable);
        self.outputs.transfer_switch = enable;
        sink.emit(&AppEvent::TransferSwitch { engaged: enable });
    }

    /// Interruptible delay against the current sequence's mode baseline.
    pub fn wait(&mut self, duration_ms: u32) -> Result<(), Cancelled> {
        self.watch.wait(duration_ms, &mut self.delay, &self.mode)
    }

    /// Take the live mode as the cancellation baseline and drop stale aborts.
    ///
    /// `start()` does this itself; callers that [`wait`](Self::wait) before
    /// starting use it so their wait is measured the same way.
    pub fn arm_watch(&mut self) {
        self.current_mode = self.mode.read();
        self.watch.arm(self.current_mode);
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn state(&self) -> GeneratorState {
        self.state
    }

    pub fn start_attempts(&self) -> u8 {
        self.start_attempts
    }

    /// Mode observed at the last checkpoint.
    pub fn current_mode(&self) -> OperatingMode {
        self.current_mode
    }

    /// Mode snapshot the current (or last) sequence is measured against.
    pub fn starting_mode(&self) -> OperatingMode {
        self.watch.baseline()
    }

    pub fn is_abort_requested(&self) -> bool {
        self.watch.abort_handle().is_requested()
    }

    pub fn transfer_switch_engaged(&self) -> bool {
        self.transfer.is_engaged()
    }

    /// Last commanded level of every line.
    pub fn outputs(&self) -> OutputLevels {
        self.outputs
    }

    pub fn last_failure(&self) -> Option<StartFailure> {
        self.last_failure
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    pub fn status(&self) -> SequencerStatus {
        SequencerStatus {
            state: self.state,
            start_attempts: self.start_attempts,
            current_mode: self.current_mode,
            transfer_switch_engaged: self.transfer.is_engaged(),
            outputs: self.outputs,
            last_failure: self.last_failure,
        }
    }

    pub fn io(&self) -> &H {
        &self.io
    }

    pub fn io_mut(&mut self) -> &mut H {
        &mut self.io
    }

    // ── Start algorithm ───────────────────────────────────────

    fn run_start_sequence(&mut self, sink: &mut impl EventSink) -> Result<(), StartFailure> {
        self.drive(OutputLine::Power, true);
        self.check_drift()?;
        self.wait(self.config.power_stabilize_delay_ms)?;

        self.drive(OutputLine::Choke, true);
        self.check_drift()?;
        self.wait(self.config.choke_engage_delay_ms)?;
        self.check_drift()?;

        if self.io.running_signal() {
            info!("Engine running after choke engage, warming up");
            sink.emit(&AppEvent::RunningDetected);
            return self.warm_up(sink);
        }

        for crank in 1..=CRANKS_PER_START {
            self.check_drift()?;

            info!("Cranking {crank}/{CRANKS_PER_START}");
            sink.emit(&AppEvent::Cranking { crank });
            self.drive(OutputLine::Starter, true);
            self.delay.delay_ms(self.config.starter_crank_duration_ms);
            self.drive(OutputLine::Starter, false);

            let io = &mut self.io;
            let started = self.watch.poll_until(
                self.config.start_monitor_duration_ms,
                &mut self.delay,
                &self.mode,
                || io.running_signal(),
            )?;
            if started {
                info!("Running signal detected after crank {crank}");
                sink.emit(&AppEvent::RunningDetected);
                return self.warm_up(sink);
            }

            warn!(
                "No running signal within {} ms of crank {crank}",
                self.config.start_monitor_duration_ms
            );
            if crank < CRANKS_PER_START {
                self.check_drift()?;
                self.wait(self.config.retry_attempt_delay_ms)?;
            }
        }

        Err(StartFailure::StartTimeout)
    }

    /// Choke-release warm-up, drift-checked around each wait.
    fn warm_up(&mut self, sink: &mut impl EventSink) -> Result<(), StartFailure> {
        self.wait(self.config.choke_warmup_delay_ms)?;
        self.check_drift()?;
        self.drive(OutputLine::Choke, false);
        sink.emit(&AppEvent::ChokeReleased);

        self.wait(self.config.post_choke_warmup_delay_ms)?;
        self.check_drift()?;
        Ok(())
    }

    /// Refresh `current_mode` and fail on abort or drift from the baseline.
    fn check_drift(&mut self) -> Result<(), Cancelled> {
        match self.watch.check(&self.mode) {
            Ok(live) => {
                self.current_mode = live;
                Ok(())
            }
            Err(cancelled) => {
                if let Cancelled::ModeChange(live) = cancelled {
                    warn!("Mode changed {} -> {live} during start", self.watch.baseline());
                    self.current_mode = live;
                }
                Err(cancelled)
            }
        }
    }

    // ── Internal ──────────────────────────────────────────────

    fn mark_running(&mut self, sink: &mut impl EventSink) -> bool {
        self.last_failure = None;
        self.transition(GeneratorState::Running, sink);
        true
    }

    fn record_failure(&mut self, failure: StartFailure, sink: &mut impl EventSink) {
        self.last_failure = Some(failure);
        sink.emit(&AppEvent::StartFailed(failure));
    }

    /// Safe state without touching the attempt budget.
    fn release_all(&mut self, sink: &mut impl EventSink) {
        self.transfer.set(&mut self.io, false);
        self.outputs.transfer_switch = false;
        self.drive(OutputLine::Starter, false);
        self.drive(OutputLine::Choke, false);
        self.drive(OutputLine::Power, false);

        self.transition(GeneratorState::Off, sink);
        self.current_mode = self.mode.read();
        sink.emit(&AppEvent::Stopped);
    }

    fn drive(&mut self, line: OutputLine, energized: bool) {
        self.io.set_output(line, energized);
        self.outputs.set(line, energized);
    }

    fn transition(&mut self, next: GeneratorState, sink: &mut impl EventSink) {
        if next == self.state {
            return;
        }
        info!("Generator: {} -> {}", self.state.name(), next.name());
        sink.emit(&AppEvent::StateChanged {
            from: self.state,
            to: next,
        });
        self.state = next;
    }
}
