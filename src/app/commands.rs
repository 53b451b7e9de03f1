//! Inbound commands to the application service.
//!
//! These represent actions requested by the outside world (remote accessory
//! bridge, serial console, front panel) that the
//! [`AppService`](super::service::AppService) interprets and acts upon.

use crate::mode::OperatingMode;

/// Commands that external adapters can send into the controller core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppCommand {
    /// Change the operating mode.  OFF also stops the generator.
    SetMode(OperatingMode),

    /// Run the start sequence, then engage the transfer switch after the
    /// transfer delay.
    StartGenerator,

    /// Release the transfer switch and stop the generator.
    StopGenerator,

    /// Abort an in-flight start sequence.
    Abort,

    /// Directly command the transfer switch.
    SetTransferSwitch(bool),
}
