//! Outbound application events.
//!
//! The sequencer and [`AppService`](super::service::AppService) emit these
//! through the [`EventSink`](super::ports::EventSink) port.  Adapters on the
//! other side decide what to do with them: log to serial, reflect the state
//! on the remote accessory, record them in a test.

use crate::error::StartFailure;
use crate::fsm::GeneratorState;
use crate::mode::OperatingMode;

/// Structured events emitted by the controller core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEvent {
    /// The sequencer moved between lifecycle states.
    StateChanged {
        from: GeneratorState,
        to: GeneratorState,
    },

    /// An outer start attempt began.
    StartAttempt { attempt: u8, max: u8 },

    /// The starter is about to be energized for crank `crank` of 3.
    Cranking { crank: u8 },

    /// The running signal was observed.
    RunningDetected,

    /// The choke was released after warm-up.
    ChokeReleased,

    /// A start sequence failed; actuators are back in safe state.
    StartFailed(StartFailure),

    /// All actuators were de-energized.
    Stopped,

    /// The transfer switch was commanded.
    TransferSwitch { engaged: bool },

    /// The operating mode was changed through the service.
    ModeChanged {
        from: OperatingMode,
        to: OperatingMode,
    },

    /// Grid loss was confirmed by the monitor.
    GridOutage,

    /// Grid return was confirmed by the monitor.
    GridRestored,

    /// The output supervisor raised one or more faults.
    FaultDetected(u8),

    /// A command was refused.
    CommandRejected(&'static str),
}
