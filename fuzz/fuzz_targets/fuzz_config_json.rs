//! Fuzz target: `SystemConfig::from_json`
//!
//! Feeds arbitrary text to the config parser and asserts that it never
//! panics and that anything it accepts also passes `validate()`.
//!
//! cargo fuzz run fuzz_config_json

#![no_main]

use genctl::config::SystemConfig;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = core::str::from_utf8(data) else {
        return;
    };
    if let Ok(config) = SystemConfig::from_json(text) {
        assert!(config.validate().is_ok(), "accepted config must validate");
        assert!(config.max_start_attempts >= 1);
        assert!(config.mode_change_check_interval_ms <= config.start_monitor_duration_ms);
    }
});
