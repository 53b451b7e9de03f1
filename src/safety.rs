//! Output supervisor.
//!
//! Runs **between start sequences** on the main loop and accumulates a
//! fault bitmask over the sequencer's last commanded outputs.  It only
//! observes; the application service decides what a fault triggers.
//!
//! ## Fault lifecycle
//!
//! 1. An unsafe combination appears (e.g. starter on with power off).
//! 2. The supervisor sets the corresponding bit and logs the edge.
//! 3. When the combination disappears, the bit is cleared and logged.
//!
//! `TransferWhileNotRunning` is reported but never forces a stop: the
//! transfer switch carries no interlock against generator state.

use log::{error, info};

use crate::error::OutputFault;
use crate::fsm::{GeneratorState, OutputLevels};

/// Output supervisor.
#[derive(Debug, Default)]
pub struct OutputSupervisor {
    /// Latched fault bitmask.
    faults: u8,
}

impl OutputSupervisor {
    pub fn new() -> Self {
        Self { faults: 0 }
    }

    /// Evaluate the commanded outputs against the lifecycle state.
    /// Returns the updated fault bitmask.
    pub fn evaluate(&mut self, state: GeneratorState, outputs: &OutputLevels) -> u8 {
        self.eval_fault(
            OutputFault::StarterWithoutPower,
            outputs.starter && !outputs.power,
        );
        self.eval_fault(
            OutputFault::TransferWhileNotRunning,
            outputs.transfer_switch && state != GeneratorState::Running,
        );
        self.eval_fault(
            OutputFault::EnergizedWhileOff,
            state == GeneratorState::Off && !outputs.engine_safe(),
        );
        self.faults
    }

    /// Current fault bitmask.
    pub fn faults(&self) -> u8 {
        self.faults
    }

    /// True if **any** fault is active.
    pub fn has_faults(&self) -> bool {
        self.faults != 0
    }

    pub fn has_fault(&self, fault: OutputFault) -> bool {
        self.faults & fault.mask() != 0
    }

    /// True if a fault that requires de-energizing the engine is active.
    pub fn requires_stop(&self) -> bool {
        self.has_fault(OutputFault::StarterWithoutPower)
            || self.has_fault(OutputFault::EnergizedWhileOff)
    }

    // ── Internal ──────────────────────────────────────────────────

    fn eval_fault(&mut self, fault: OutputFault, condition: bool) {
        if condition {
            if self.faults & fault.mask() == 0 {
                error!("OUTPUT FAULT SET: {fault}");
            }
            self.faults |= fault.mask();
        } else {
            if self.faults & fault.mask() != 0 {
                info!("OUTPUT FAULT CLEARED: {fault}");
            }
            self.faults &= !fault.mask();
        }
    }
}
