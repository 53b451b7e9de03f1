//! Interruptible delay and mode-drift detection.
//!
//! Cancellation is cooperative: long waits are chopped into increments of
//! `mode_change_check_interval_ms`, and between increments the watch checks
//! two pieces of shared state:
//!
//! 1. the abort flag (an [`AbortHandle`], settable from any thread), and
//! 2. the live operating mode against the baseline snapshot taken when the
//!    sequence was armed.
//!
//! Either one cancels the wait.  Latency is bounded by one increment.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use embedded_hal::delay::DelayNs;
use log::debug;

use crate::app::ports::ModeSource;
use crate::error::StartFailure;
use crate::mode::OperatingMode;

// ---------------------------------------------------------------------------
// Abort flag
// ---------------------------------------------------------------------------

/// Cloneable handle to the abort flag.  Lock-free; safe to call from a
/// bridge thread while the sequence runs on another.
#[derive(Debug, Clone, Default)]
pub struct AbortHandle {
    flag: Arc<AtomicBool>,
}

impl AbortHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the in-flight sequence (if any) to cancel.
    pub fn request(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_requested(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    pub(crate) fn clear(&self) {
        self.flag.store(false, Ordering::Release);
    }
}

// ---------------------------------------------------------------------------
// Cancellation reason
// ---------------------------------------------------------------------------

/// Why an interruptible wait or poll returned early.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cancelled {
    /// The abort flag was set.
    Abort,
    /// The live mode (carried) differs from the baseline.
    ModeChange(OperatingMode),
}

impl From<Cancelled> for StartFailure {
    fn from(c: Cancelled) -> Self {
        match c {
            Cancelled::Abort => Self::AbortedExplicit,
            Cancelled::ModeChange(_) => Self::AbortedByModeChange,
        }
    }
}

// ---------------------------------------------------------------------------
// ModeWatch
// ---------------------------------------------------------------------------

/// Cancellation baseline for one start sequence.
#[derive(Debug)]
pub struct ModeWatch {
    abort: AbortHandle,
    baseline: OperatingMode,
    interval_ms: u32,
}

impl ModeWatch {
    pub fn new(abort: AbortHandle, interval_ms: u32) -> Self {
        Self {
            abort,
            baseline: OperatingMode::Off,
            interval_ms: interval_ms.max(1),
        }
    }

    /// Begin a sequence: clear any stale abort request and fix the baseline.
    pub fn arm(&mut self, baseline: OperatingMode) {
        self.abort.clear();
        self.baseline = baseline;
    }

    /// Mode snapshot the current sequence is measured against.
    pub fn baseline(&self) -> OperatingMode {
        self.baseline
    }

    pub fn abort_handle(&self) -> &AbortHandle {
        &self.abort
    }

    /// Check both cancellation conditions once.  Returns the live mode.
    pub fn check(&self, mode: &impl ModeSource) -> Result<OperatingMode, Cancelled> {
        if self.abort.is_requested() {
            return Err(Cancelled::Abort);
        }
        let live = mode.read();
        if live == self.baseline {
            Ok(live)
        } else {
            Err(Cancelled::ModeChange(live))
        }
    }

    /// Block for `duration_ms`, checking for cancellation every increment.
    pub fn wait(
        &self,
        duration_ms: u32,
        delay: &mut impl DelayNs,
        mode: &impl ModeSource,
    ) -> Result<(), Cancelled> {
        let mut elapsed = 0;
        while elapsed < duration_ms {
            self.check(mode).inspect_err(|c| {
                debug!("wait cancelled after {elapsed}/{duration_ms} ms: {c:?}");
            })?;
            let step = self.interval_ms.min(duration_ms - elapsed);
            delay.delay_ms(step);
            elapsed += step;
        }
        self.check(mode).map(|_| ())
    }

    /// Poll `condition` every increment for up to `window_ms`.
    ///
    /// Returns `Ok(true)` as soon as the condition holds, `Ok(false)` once
    /// the window has elapsed without it.
    pub fn poll_until(
        &self,
        window_ms: u32,
        delay: &mut impl DelayNs,
        mode: &impl ModeSource,
        mut condition: impl FnMut() -> bool,
    ) -> Result<bool, Cancelled> {
        let mut elapsed = 0;
        loop {
            if condition() {
                return Ok(true);
            }
            self.check(mode)?;
            if elapsed >= window_ms {
                return Ok(false);
            }
            let step = self.interval_ms.min(window_ms - elapsed);
            delay.delay_ms(step);
            elapsed += step;
        }
    }
}
