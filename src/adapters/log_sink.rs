//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured controller events to the
//! `log` facade (ESP-IDF logger on target, whatever logger the host
//! installs in simulation).  A remote-accessory adapter would implement the
//! same trait.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Inner width of the boot banner box.
const BANNER_WIDTH: usize = 38;

/// Top, title and bottom lines of a boxed boot banner.
///
/// The box grows to fit titles longer than the default width.
pub fn banner(title: &str) -> [String; 3] {
    let inner = BANNER_WIDTH.max(title.chars().count() + 4);
    let rule = "═".repeat(inner);
    [
        format!("╔{rule}╗"),
        format!("║  {title:<width$}║", width = inner - 2),
        format!("╚{rule}╝"),
    ]
}

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::StateChanged { from, to } => {
                info!("STATE | {} -> {}", from.name(), to.name());
            }
            AppEvent::StartAttempt { attempt, max } => {
                info!("START | attempt {}/{}", attempt, max);
            }
            AppEvent::Cranking { crank } => info!("CRANK | {}", crank),
            AppEvent::RunningDetected => info!("START | running signal"),
            AppEvent::ChokeReleased => info!("START | choke released"),
            AppEvent::StartFailed(reason) => warn!("START | failed: {}", reason),
            AppEvent::Stopped => info!("STOP  | all lines de-energized"),
            AppEvent::TransferSwitch { engaged } => {
                info!("XFER  | {}", if *engaged { "engaged" } else { "released" });
            }
            AppEvent::ModeChanged { from, to } => info!("MODE  | {} -> {}", from, to),
            AppEvent::GridOutage => warn!("GRID  | outage confirmed"),
            AppEvent::GridRestored => info!("GRID  | restored"),
            AppEvent::FaultDetected(flags) => {
                warn!("FAULT | detected, flags=0b{:08b}", flags);
            }
            AppEvent::CommandRejected(why) => warn!("CMD   | rejected: {}", why),
        }
    }
}
