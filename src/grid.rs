//! Grid power monitor.
//!
//! Debounces the raw grid-present input into confirmed transitions:
//!
//! - an **outage** is confirmed once the input has read absent continuously
//!   for `grid_outage_confirm_delay_ms`;
//! - a **restore** once it has read present continuously for
//!   `grid_restore_confirm_delay_ms`;
//! - after either, no new transition is accepted for
//!   `grid_monitor_debounce_ms`.
//!
//! The monitor starts assuming the grid is present.

use log::{info, warn};

use crate::config::SystemConfig;

/// Confirmed grid transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridEvent {
    OutageConfirmed,
    RestoreConfirmed,
}

pub struct GridMonitor {
    outage_confirm_ms: u64,
    restore_confirm_ms: u64,
    debounce_ms: u64,
    /// Confirmed grid state.
    grid_ok: bool,
    /// When the raw input started disagreeing with `grid_ok`.
    pending_since: Option<u64>,
    last_transition: Option<u64>,
}

impl GridMonitor {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            outage_confirm_ms: u64::from(config.grid_outage_confirm_delay_ms),
            restore_confirm_ms: u64::from(config.grid_restore_confirm_delay_ms),
            debounce_ms: u64::from(config.grid_monitor_debounce_ms),
            grid_ok: true,
            pending_since: None,
            last_transition: None,
        }
    }

    /// Feed one raw sample.  Returns an event when a transition is confirmed.
    pub fn update(&mut self, now_ms: u64, grid_present: bool) -> Option<GridEvent> {
        if grid_present == self.grid_ok {
            self.pending_since = None;
            return None;
        }

        let since = *self.pending_since.get_or_insert(now_ms);

        if let Some(last) = self.last_transition {
            if now_ms.saturating_sub(last) < self.debounce_ms {
                return None;
            }
        }

        let confirm_ms = if self.grid_ok {
            self.outage_confirm_ms
        } else {
            self.restore_confirm_ms
        };
        if now_ms.saturating_sub(since) < confirm_ms {
            return None;
        }

        self.grid_ok = grid_present;
        self.pending_since = None;
        self.last_transition = Some(now_ms);

        if grid_present {
            info!("Grid restored (confirmed at {} ms)", now_ms);
            Some(GridEvent::RestoreConfirmed)
        } else {
            warn!("Grid outage confirmed at {} ms", now_ms);
            Some(GridEvent::OutageConfirmed)
        }
    }

    /// Confirmed grid state.
    pub fn grid_ok(&self) -> bool {
        self.grid_ok
    }
}
