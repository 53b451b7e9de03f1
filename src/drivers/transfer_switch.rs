//! Transfer switch relay driver.
//!
//! Maps a boolean intent onto the transfer-switch output line.  Polarity is
//! the I/O adapter's concern; this driver only remembers the last command.
//!
//! ## Safety contract
//!
//! The switch must only connect the load once the generator is running.
//! That interlock belongs to the caller; this driver is a dumb actuator.

use log::info;

use crate::app::ports::GeneratorIo;
use crate::fsm::OutputLine;

#[derive(Debug, Default)]
pub struct TransferSwitch {
    engaged: bool,
}

impl TransferSwitch {
    pub fn new() -> Self {
        Self { engaged: false }
    }

    pub fn set(&mut self, io: &mut impl GeneratorIo, enable: bool) {
        io.set_output(OutputLine::TransferSwitch, enable);
        if enable != self.engaged {
            info!("Transfer switch {}", if enable { "engaged" } else { "released" });
        }
        self.engaged = enable;
    }

    pub fn is_engaged(&self) -> bool {
        self.engaged
    }
}
