//! Generator lifecycle state machine.
//!
//! ```text
//!            start()            success
//!   ┌─────┐ ────────▶ ┌──────────┐ ──────▶ ┌─────────┐
//!   │ Off │           │ Starting │         │ Running │
//!   └─────┘ ◀──────── └──────────┘         └─────────┘
//!      ▲     failure / abort / stop()           │
//!      └────────────────── stop() ──────────────┘
//! ```
//!
//! `Stopping` exists in the enumeration but no transition enters it;
//! `stop()` is instantaneous.  The sequencer in [`sequencer`] drives the
//! transitions; [`watch`] provides the interruptible delay it is built on.

pub mod sequencer;
pub mod watch;

use serde::Serialize;

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

/// Lifecycle phase of the generator as seen by the sequencer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum GeneratorState {
    Off = 0,
    Starting = 1,
    Running = 2,
    /// Reserved; never entered.
    Stopping = 3,
}

impl GeneratorState {
    /// Total number of states.
    pub const COUNT: usize = 4;

    /// Convert a `u8` index back to `GeneratorState`.  Out-of-range values
    /// map to `Off` (the safe fallback) in release builds.
    pub fn from_index(idx: usize) -> Self {
        match idx {
            0 => Self::Off,
            1 => Self::Starting,
            2 => Self::Running,
            3 => Self::Stopping,
            _ => {
                debug_assert!(false, "invalid generator state index: {idx}");
                Self::Off
            }
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Off => "OFF",
            Self::Starting => "STARTING",
            Self::Running => "RUNNING",
            Self::Stopping => "STOPPING",
        }
    }
}

// ---------------------------------------------------------------------------
// Actuator lines
// ---------------------------------------------------------------------------

/// Logical output lines.  Electrical polarity is the I/O adapter's concern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum OutputLine {
    Power,
    Choke,
    Starter,
    TransferSwitch,
}

impl OutputLine {
    pub const ALL: [Self; 4] = [Self::Power, Self::Choke, Self::Starter, Self::TransferSwitch];
}

/// Last commanded level of every output line (`true` = energized).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OutputLevels {
    pub power: bool,
    pub choke: bool,
    pub starter: bool,
    pub transfer_switch: bool,
}

impl OutputLevels {
    /// Everything de-energized.
    pub fn all_off() -> Self {
        Self::default()
    }

    pub fn get(&self, line: OutputLine) -> bool {
        match line {
            OutputLine::Power => self.power,
            OutputLine::Choke => self.choke,
            OutputLine::Starter => self.starter,
            OutputLine::TransferSwitch => self.transfer_switch,
        }
    }

    pub fn set(&mut self, line: OutputLine, energized: bool) {
        match line {
            OutputLine::Power => self.power = energized,
            OutputLine::Choke => self.choke = energized,
            OutputLine::Starter => self.starter = energized,
            OutputLine::TransferSwitch => self.transfer_switch = energized,
        }
    }

    /// True when none of the engine lines (power, choke, starter) is energized.
    pub fn engine_safe(&self) -> bool {
        !self.power && !self.choke && !self.starter
    }
}
