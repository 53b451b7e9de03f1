//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ GeneratorSequencer / AppService (domain)
//! ```
//!
//! Driven adapters (GPIO lines, mode storage, event sinks) implement these
//! traits.  The domain consumes them via generics, so the sequencer never
//! touches hardware directly and runs unchanged against simulated boards.
//! Timing goes through [`embedded_hal::delay::DelayNs`].

use crate::fsm::OutputLine;
use crate::mode::OperatingMode;

// ───────────────────────────────────────────────────────────────
// Generator I/O port (domain ↔ relay outputs and running signal)
// ───────────────────────────────────────────────────────────────

/// Digital I/O for the generator and transfer switch.
///
/// `energized` is the logical level: pin polarity and pull-up inversion are
/// the implementation's responsibility.  Writes are assumed to succeed.
pub trait GeneratorIo {
    /// Command a logical output line.
    fn set_output(&mut self, line: OutputLine, energized: bool);

    /// Whether the generator reports that it is running.
    fn running_signal(&mut self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Operating mode source (driven adapter: owner ─▶ domain)
// ───────────────────────────────────────────────────────────────

/// Read accessor for the externally owned operating mode.
///
/// The core only reads.  When the host runs other threads that change the
/// mode (an accessory bridge, say), the implementation must make `read`
/// thread-safe; [`SharedMode`](crate::adapters::mode::SharedMode) does this
/// with an atomic.
pub trait ModeSource {
    fn read(&self) -> OperatingMode;
}

impl<M: ModeSource + ?Sized> ModeSource for &M {
    fn read(&self) -> OperatingMode {
        (**self).read()
    }
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go (serial log, bridge
/// characteristic, test recorder).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}
