//! Remote mode switches.
//!
//! The accessory bridge exposes one on/off switch per operating mode.  The
//! switches are exclusive: turning one on turns the others off and selects
//! that mode.  Only the OFF switch may be turned off directly; switching
//! AUTO or MANUAL off snaps it back on and lights the OFF switch so the
//! owner has to pick OFF deliberately.
//!
//! The bank is an owned collection keyed by mode, handed to the bridge at
//! construction.  Protocol framing lives in the bridge, not here.

use heapless::Vec;
use log::{debug, info};

use crate::mode::OperatingMode;

/// One remote switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeSwitch {
    pub mode: OperatingMode,
    pub on: bool,
}

/// The three exclusive mode switches.
#[derive(Debug, Clone)]
pub struct ModeSwitchBank {
    switches: Vec<ModeSwitch, 3>,
}

impl ModeSwitchBank {
    /// Build the bank with only `initial`'s switch on.
    pub fn new(initial: OperatingMode) -> Self {
        let switches = OperatingMode::ALL
            .iter()
            .map(|&mode| ModeSwitch {
                mode,
                on: mode == initial,
            })
            .collect();
        Self { switches }
    }

    /// Apply a remote write to `mode`'s switch.
    ///
    /// Returns the mode the controller should change to, if any.
    pub fn request(&mut self, mode: OperatingMode, on: bool) -> Option<OperatingMode> {
        if on {
            for sw in &mut self.switches {
                sw.on = sw.mode == mode;
            }
            info!("Mode switch: {} selected", mode);
            return Some(mode);
        }

        if mode == OperatingMode::Off {
            self.set(OperatingMode::Off, false);
            debug!("Mode switch: OFF switch cleared");
            return None;
        }

        // AUTO / MANUAL cannot be switched off directly.
        self.set(mode, true);
        self.set(OperatingMode::Off, true);
        info!("Mode switch: {} cannot be turned off, offering OFF", mode);
        None
    }

    /// Force the bank to reflect `current`.
    pub fn sync(&mut self, current: OperatingMode) {
        for sw in &mut self.switches {
            sw.on = sw.mode == current;
        }
    }

    pub fn is_on(&self, mode: OperatingMode) -> bool {
        self.switches.iter().any(|sw| sw.mode == mode && sw.on)
    }

    pub fn switches(&self) -> &[ModeSwitch] {
        &self.switches
    }

    fn set(&mut self, mode: OperatingMode, on: bool) {
        if let Some(sw) = self.switches.iter_mut().find(|sw| sw.mode == mode) {
            sw.on = on;
        }
    }
}
