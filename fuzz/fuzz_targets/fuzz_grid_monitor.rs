//! Fuzz target: `GridMonitor::update`
//!
//! Each input byte is one sample: the low bit is the grid level and the
//! rest is the time step.  Confirmed events must alternate and respect the
//! debounce hold-off no matter how noisy the input is.
//!
//! cargo fuzz run fuzz_grid_monitor

#![no_main]

use genctl::config::SystemConfig;
use genctl::grid::{GridEvent, GridMonitor};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let config = SystemConfig {
        grid_outage_confirm_delay_ms: 200,
        grid_restore_confirm_delay_ms: 300,
        grid_monitor_debounce_ms: 100,
        ..SystemConfig::default()
    };
    let mut monitor = GridMonitor::new(&config);

    let mut now = 0u64;
    let mut last: Option<(u64, GridEvent)> = None;
    for byte in data {
        now += u64::from(byte >> 1);
        let present = byte & 1 == 1;
        if let Some(event) = monitor.update(now, present) {
            if let Some((at, previous)) = last {
                assert_ne!(event, previous, "events must alternate");
                assert!(now - at >= 100, "debounce violated");
            } else {
                assert_eq!(event, GridEvent::OutageConfirmed);
            }
            last = Some((now, event));
        }
    }
});
