//! Operating mode selected by the owner (remote app, front panel).
//!
//! The mode is owned and mutated outside the controller; the core only ever
//! reads it through [`ModeSource`](crate::app::ports::ModeSource).

use core::fmt;

use serde::{Deserialize, Serialize};

/// Externally controlled selection governing whether/how the generator may run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum OperatingMode {
    /// System disabled: the generator must not run.
    Off = 0,
    /// Automatic grid monitoring.
    Auto = 1,
    /// Manual control only.
    Manual = 2,
}

impl OperatingMode {
    /// Every mode, in switch-bank order.
    pub const ALL: [Self; 3] = [Self::Off, Self::Auto, Self::Manual];

    /// Decode the `u8` representation used by the shared atomic cell.
    /// Unknown values decode as `Off` (the safe mode).
    pub fn from_u8(raw: u8) -> Self {
        match raw {
            1 => Self::Auto,
            2 => Self::Manual,
            _ => Self::Off,
        }
    }

    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for OperatingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Off => write!(f, "OFF"),
            Self::Auto => write!(f, "AUTO"),
            Self::Manual => write!(f, "MANUAL"),
        }
    }
}
