//! Hardware adapter: bridges embedded-hal GPIO pins to the [`GeneratorIo`] port.
//!
//! This is the only module in the system that touches pins.  Relay boards
//! and running-signal inputs differ in polarity, so each side carries a
//! [`Polarity`]; the sequencer above only ever speaks in "energized".
//! Pin errors are logged and swallowed: at this layer a digital write is
//! assumed to succeed, and an unreadable running input reads as "not running".

use embedded_hal::digital::{InputPin, OutputPin};
use log::warn;

use crate::app::ports::GeneratorIo;
use crate::fsm::OutputLine;

/// Electrical level that means "energized" / "asserted".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Polarity {
    #[default]
    ActiveHigh,
    ActiveLow,
}

impl Polarity {
    /// Physical pin level for a logical state.
    pub fn level(self, active: bool) -> bool {
        match self {
            Self::ActiveHigh => active,
            Self::ActiveLow => !active,
        }
    }
}

/// Concrete adapter over four relay outputs and the running-signal input.
pub struct GpioAdapter<P, C, S, T, R> {
    power: P,
    choke: C,
    starter: S,
    transfer: T,
    running: R,
    output_polarity: Polarity,
    running_polarity: Polarity,
}

impl<P, C, S, T, R> GpioAdapter<P, C, S, T, R>
where
    P: OutputPin,
    C: OutputPin,
    S: OutputPin,
    T: OutputPin,
    R: InputPin,
{
    pub fn new(power: P, choke: C, starter: S, transfer: T, running: R) -> Self {
        Self {
            power,
            choke,
            starter,
            transfer,
            running,
            output_polarity: Polarity::ActiveHigh,
            running_polarity: Polarity::ActiveHigh,
        }
    }

    /// Relay driver polarity (shared by all four outputs).
    #[must_use]
    pub fn with_output_polarity(mut self, polarity: Polarity) -> Self {
        self.output_polarity = polarity;
        self
    }

    /// Running-signal polarity (active-low for a pulled-up sense line).
    #[must_use]
    pub fn with_running_polarity(mut self, polarity: Polarity) -> Self {
        self.running_polarity = polarity;
        self
    }
}

fn write_pin<O: OutputPin>(pin: &mut O, high: bool, line: OutputLine) {
    let result = if high { pin.set_high() } else { pin.set_low() };
    if let Err(e) = result {
        warn!("GPIO write failed on {:?}: {:?}", line, e);
    }
}

// ── GeneratorIo implementation ────────────────────────────────

impl<P, C, S, T, R> GeneratorIo for GpioAdapter<P, C, S, T, R>
where
    P: OutputPin,
    C: OutputPin,
    S: OutputPin,
    T: OutputPin,
    R: InputPin,
{
    fn set_output(&mut self, line: OutputLine, energized: bool) {
        let high = self.output_polarity.level(energized);
        match line {
            OutputLine::Power => write_pin(&mut self.power, high, line),
            OutputLine::Choke => write_pin(&mut self.choke, high, line),
            OutputLine::Starter => write_pin(&mut self.starter, high, line),
            OutputLine::TransferSwitch => write_pin(&mut self.transfer, high, line),
        }
    }

    fn running_signal(&mut self) -> bool {
        match self.running.is_high() {
            Ok(high) => self.running_polarity.level(high),
            Err(e) => {
                warn!("GPIO read failed on running signal: {:?}", e);
                false
            }
        }
    }
}
