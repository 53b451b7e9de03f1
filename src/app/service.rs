//! Application service: the hexagonal core.
//!
//! [`AppService`] owns the sequencer, grid monitor and output supervisor,
//! and holds a handle to the shared operating mode.  It is what an
//! accessory bridge or the main loop talks to.
//!
//! ```text
//!  grid input ──▶ ┌──────────────────────────────┐ ──▶ EventSink
//!                 │          AppService          │
//!  AppCommand ──▶ │ Sequencer · Grid · Supervisor│
//!                 └──────────────────────────────┘
//!                        │ GeneratorIo / DelayNs
//! ```
//!
//! Two pieces of state are shared with other threads: the abort flag
//! ([`abort_handle`](AppService::abort_handle)) and the mode cell
//! ([`mode_handle`](AppService::mode_handle)).  Both are atomics.

use embedded_hal::delay::DelayNs;
use log::{info, warn};

use crate::adapters::mode::SharedMode;
use crate::config::SystemConfig;
use crate::error::{Error, Result, StartFailure};
use crate::fsm::sequencer::{GeneratorSequencer, SequencerStatus};
use crate::fsm::watch::AbortHandle;
use crate::fsm::GeneratorState;
use crate::grid::{GridEvent, GridMonitor};
use crate::mode::OperatingMode;
use crate::safety::OutputSupervisor;

use super::commands::AppCommand;
use super::events::AppEvent;
use super::ports::{EventSink, GeneratorIo};

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates all controller logic.
pub struct AppService<H, D> {
    sequencer: GeneratorSequencer<H, D, SharedMode>,
    mode: SharedMode,
    grid: GridMonitor,
    supervisor: OutputSupervisor,
    /// AUTO mode owes a start attempt for a confirmed outage.
    auto_start_pending: bool,
}

impl<H, D> AppService<H, D>
where
    H: GeneratorIo,
    D: DelayNs,
{
    /// Construct the service with a fresh mode cell in `config.default_mode`.
    pub fn new(config: SystemConfig, io: H, delay: D) -> Self {
        let mode = SharedMode::new(config.default_mode);
        Self::with_mode(config, io, delay, mode)
    }

    /// Construct the service around an existing mode cell.
    pub fn with_mode(config: SystemConfig, io: H, delay: D, mode: SharedMode) -> Self {
        let grid = GridMonitor::new(&config);
        let sequencer = GeneratorSequencer::new(config, io, delay, mode.clone());
        info!("AppService ready in mode {}", mode.get());
        Self {
            sequencer,
            mode,
            grid,
            supervisor: OutputSupervisor::new(),
            auto_start_pending: false,
        }
    }

    // ── Command handling ──────────────────────────────────────

    /// Process an external command (bridge, console, front panel).
    pub fn handle_command(&mut self, cmd: AppCommand, sink: &mut impl EventSink) -> Result<()> {
        match cmd {
            AppCommand::SetMode(mode) => {
                self.change_mode(mode, sink);
                Ok(())
            }
            AppCommand::StartGenerator => self.start_generator(sink),
            AppCommand::StopGenerator => {
                self.stop_generator(sink);
                Ok(())
            }
            AppCommand::Abort => {
                self.sequencer.abort();
                Ok(())
            }
            AppCommand::SetTransferSwitch(enable) => {
                self.sequencer.set_transfer_switch(enable, sink);
                Ok(())
            }
        }
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one main-loop cycle: grid monitor → mode policy → supervisor.
    ///
    /// May block for a whole start sequence when AUTO mode reacts to an
    /// outage.
    pub fn tick(&mut self, now_ms: u64, grid_present: bool, sink: &mut impl EventSink) {
        match self.grid.update(now_ms, grid_present) {
            Some(GridEvent::OutageConfirmed) => {
                sink.emit(&AppEvent::GridOutage);
                self.auto_start_pending = true;
            }
            Some(GridEvent::RestoreConfirmed) => {
                sink.emit(&AppEvent::GridRestored);
                self.auto_start_pending = false;
                if self.mode.get() == OperatingMode::Auto
                    && self.sequencer.state() != GeneratorState::Off
                {
                    info!("Grid back, shutting generator down");
                    self.stop_generator(sink);
                }
            }
            None => {}
        }

        match self.mode.get() {
            OperatingMode::Off => {
                let status = self.sequencer.status();
                if status.state != GeneratorState::Off
                    || !status.outputs.engine_safe()
                    || status.transfer_switch_engaged
                {
                    self.stop_generator(sink);
                }
            }
            OperatingMode::Auto => {
                if self.auto_start_pending && self.sequencer.state() == GeneratorState::Off {
                    self.auto_start(sink);
                }
            }
            OperatingMode::Manual => {}
        }

        self.supervise(sink);
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn status(&self) -> SequencerStatus {
        self.sequencer.status()
    }

    pub fn state(&self) -> GeneratorState {
        self.sequencer.state()
    }

    pub fn mode(&self) -> OperatingMode {
        self.mode.get()
    }

    /// Confirmed grid state.
    pub fn grid_ok(&self) -> bool {
        self.grid.grid_ok()
    }

    /// Current output fault bitmask (0 = no faults).
    pub fn fault_flags(&self) -> u8 {
        self.supervisor.faults()
    }

    /// Abort flag handle for another thread.
    pub fn abort_handle(&self) -> AbortHandle {
        self.sequencer.abort_handle()
    }

    /// Mode cell handle for another thread.
    pub fn mode_handle(&self) -> SharedMode {
        self.mode.clone()
    }

    pub fn sequencer(&self) -> &GeneratorSequencer<H, D, SharedMode> {
        &self.sequencer
    }

    pub fn sequencer_mut(&mut self) -> &mut GeneratorSequencer<H, D, SharedMode> {
        &mut self.sequencer
    }

    // ── Internal ──────────────────────────────────────────────

    fn change_mode(&mut self, mode: OperatingMode, sink: &mut impl EventSink) {
        let previous = self.mode.set(mode);
        if previous != mode {
            info!("Mode {} -> {}", previous, mode);
            sink.emit(&AppEvent::ModeChanged {
                from: previous,
                to: mode,
            });
        }
        if mode == OperatingMode::Off {
            self.stop_generator(sink);
        }
    }

    /// MANUAL prep, start, wait out the transfer delay, then connect the load.
    fn start_generator(&mut self, sink: &mut impl EventSink) -> Result<()> {
        if self.mode.get() == OperatingMode::Off {
            let why = "generator start refused in OFF mode";
            warn!("{why}");
            sink.emit(&AppEvent::CommandRejected(why));
            return Err(Error::Rejected(why));
        }
        if self.sequencer.state() == GeneratorState::Running {
            info!("Generator already running");
            return Ok(());
        }
        if self.mode.get() == OperatingMode::Manual {
            self.manual_prep(sink)?;
        }

        if !self.sequencer.start(sink) {
            let failure = self
                .sequencer
                .last_failure()
                .unwrap_or(StartFailure::StartTimeout);
            return Err(failure.into());
        }

        let delay_ms = self.sequencer.config().transfer_switch_delay_ms;
        info!("Generator running, transferring load in {} ms", delay_ms);
        match self.sequencer.wait(delay_ms) {
            Ok(()) => {
                self.sequencer.set_transfer_switch(true, sink);
                Ok(())
            }
            Err(cancelled) => {
                warn!("Transfer cancelled: {:?}", cancelled);
                self.sequencer.stop(sink);
                Err(StartFailure::from(cancelled).into())
            }
        }
    }

    /// Grace period before a MANUAL start, cancelled like any other wait.
    fn manual_prep(&mut self, sink: &mut impl EventSink) -> Result<()> {
        let prep_ms = self.sequencer.config().manual_start_prep_delay_ms;
        if prep_ms == 0 {
            return Ok(());
        }
        info!("Manual start in {} ms", prep_ms);
        self.sequencer.arm_watch();
        self.sequencer.wait(prep_ms).map_err(|cancelled| {
            let failure = StartFailure::from(cancelled);
            warn!("Manual start cancelled before cranking: {failure}");
            sink.emit(&AppEvent::StartFailed(failure));
            failure.into()
        })
    }

    fn auto_start(&mut self, sink: &mut impl EventSink) {
        match self.start_generator(sink) {
            Ok(()) => self.auto_start_pending = false,
            Err(Error::Start(StartFailure::StartAttemptsExhausted)) => {
                warn!("AUTO start gave up, waiting for the grid to return");
                self.auto_start_pending = false;
            }
            Err(e) => warn!("AUTO start failed: {}", e),
        }
    }

    fn stop_generator(&mut self, sink: &mut impl EventSink) {
        if self.sequencer.transfer_switch_engaged() {
            self.sequencer.set_transfer_switch(false, sink);
        }
        self.sequencer.stop(sink);
    }

    fn supervise(&mut self, sink: &mut impl EventSink) {
        let previous = self.supervisor.faults();
        let status = self.sequencer.status();
        let faults = self.supervisor.evaluate(status.state, &status.outputs);
        if faults & !previous != 0 {
            warn!("Output fault! flags=0b{:08b}", faults);
            sink.emit(&AppEvent::FaultDetected(faults));
        }
        if self.supervisor.requires_stop() {
            self.stop_generator(sink);
            let status = self.sequencer.status();
            self.supervisor.evaluate(status.state, &status.outputs);
        }
    }
}
