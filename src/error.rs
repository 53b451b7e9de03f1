//! Error types for the generator controller.
//!
//! Start failures are never fatal: every one of them funnels into a
//! safe-state reset of the actuators.  They are `Copy` so the sequencer can
//! record the last one and hand it to event sinks without allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A start sequence failed and the actuators were returned to safe state.
    Start(StartFailure),
    /// Configuration is invalid.
    Config(&'static str),
    /// A command was refused in the current operating mode or state.
    Rejected(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start(e) => write!(f, "start: {e}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Rejected(msg) => write!(f, "rejected: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Start failures
// ---------------------------------------------------------------------------

/// Why a start sequence did not reach `Running`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartFailure {
    /// Running signal never asserted within the monitor window of any crank.
    StartTimeout,
    /// Outer attempt budget was already spent when `start()` was called.
    StartAttemptsExhausted,
    /// Live operating mode diverged from the snapshot taken at sequence start.
    AbortedByModeChange,
    /// `abort()` was requested during the sequence.
    AbortedExplicit,
}

impl StartFailure {
    /// True for the two cancellation outcomes.
    pub const fn is_abort(self) -> bool {
        matches!(self, Self::AbortedByModeChange | Self::AbortedExplicit)
    }
}

impl fmt::Display for StartFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StartTimeout => write!(f, "generator did not start"),
            Self::StartAttemptsExhausted => write!(f, "start attempts exhausted"),
            Self::AbortedByModeChange => write!(f, "aborted by mode change"),
            Self::AbortedExplicit => write!(f, "aborted on request"),
        }
    }
}

impl From<StartFailure> for Error {
    fn from(e: StartFailure) -> Self {
        Self::Start(e)
    }
}

// ---------------------------------------------------------------------------
// Output faults
// ---------------------------------------------------------------------------

/// Unsafe combinations of commanded outputs, accumulated in a bitfield by
/// the output supervisor so several can be tracked at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OutputFault {
    /// Starter relay energized while generator power is off.
    StarterWithoutPower = 0b0000_0001,
    /// Transfer switch engaged while the generator is not running.
    TransferWhileNotRunning = 0b0000_0010,
    /// Power, choke or starter energized while the sequencer is OFF.
    EnergizedWhileOff = 0b0000_0100,
}

impl OutputFault {
    pub const ALL: [Self; 3] = [
        Self::StarterWithoutPower,
        Self::TransferWhileNotRunning,
        Self::EnergizedWhileOff,
    ];

    /// Return the bitmask for this fault.
    pub const fn mask(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for OutputFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StarterWithoutPower => write!(f, "starter without power"),
            Self::TransferWhileNotRunning => write!(f, "transfer switch engaged while not running"),
            Self::EnergizedWhileOff => write!(f, "engine line energized while off"),
        }
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
