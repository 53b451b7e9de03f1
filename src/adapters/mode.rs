//! Shared operating-mode cell.
//!
//! The mode is written by whoever owns it (accessory bridge, service) and
//! read by the sequencer mid-sequence, possibly from another thread.  The
//! cell is a single `AtomicU8`, so reads never block and never tear.

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use crate::app::ports::ModeSource;
use crate::mode::OperatingMode;

/// Clone-shared, lock-free operating mode.
#[derive(Debug, Clone)]
pub struct SharedMode {
    cell: Arc<AtomicU8>,
}

impl SharedMode {
    pub fn new(initial: OperatingMode) -> Self {
        Self {
            cell: Arc::new(AtomicU8::new(initial.as_u8())),
        }
    }

    /// Store a new mode and return the previous one.
    pub fn set(&self, mode: OperatingMode) -> OperatingMode {
        OperatingMode::from_u8(self.cell.swap(mode.as_u8(), Ordering::AcqRel))
    }

    pub fn get(&self) -> OperatingMode {
        OperatingMode::from_u8(self.cell.load(Ordering::Acquire))
    }
}

impl ModeSource for SharedMode {
    fn read(&self) -> OperatingMode {
        self.get()
    }
}
