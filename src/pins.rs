//! GPIO pin assignments for the generator controller board.
//!
//! Single source of truth: the binary and the log banner reference this
//! module rather than hard-coding pin numbers.

use log::error;

use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// Digital input: grid power present.
pub const GRID_MONITOR_GPIO: i32 = 32;
/// Digital input: generator running signal (active-low, pulled up).
pub const GENERATOR_RUNNING_GPIO: i32 = 33;

// ---------------------------------------------------------------------------
// Outputs (relay drivers)
// ---------------------------------------------------------------------------

/// Generator power / ignition relay.
pub const GENERATOR_POWER_GPIO: i32 = 25;
/// Choke solenoid relay.
pub const GENERATOR_CHOKE_GPIO: i32 = 26;
/// Starter motor relay.
pub const GENERATOR_STARTER_GPIO: i32 = 27;
/// Transfer switch relay: connects generator output to the load.
pub const TRANSFER_SWITCH_GPIO: i32 = 14;

/// Confirm that a GPIO claimed by the binary is the one assigned above.
///
/// `PinDriver` takes typed peripherals (`gpio25`, ...), so the binary names
/// each pin twice; this catches the two drifting apart at boot.
pub fn check(claimed: i32, assigned: i32, line: &'static str) -> Result<()> {
    if claimed == assigned {
        Ok(())
    } else {
        error!("{line}: driver holds GPIO{claimed}, pin map assigns GPIO{assigned}");
        Err(Error::Config(line))
    }
}
