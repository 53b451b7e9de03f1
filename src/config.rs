//! System configuration parameters.
//!
//! All tunable parameters for the generator controller.  Durations are in
//! milliseconds and only affect timing, never the shape of the start
//! sequence.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::mode::OperatingMode;

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    /// Mode the system boots into.
    pub default_mode: OperatingMode,
    /// Outer start attempts before the sequencer forces a full stop.
    pub max_start_attempts: u8,

    // --- Grid monitoring ---
    /// How long the grid must read absent before an outage is confirmed
    pub grid_outage_confirm_delay_ms: u32,
    /// How long the grid must read present before restoration is confirmed
    pub grid_restore_confirm_delay_ms: u32,
    /// Hold-off after a confirmed grid transition
    pub grid_monitor_debounce_ms: u32,

    // --- Generator start sequence ---
    /// Wait after energizing generator power
    pub power_stabilize_delay_ms: u32,
    /// Wait after engaging the choke
    pub choke_engage_delay_ms: u32,
    /// How long the starter motor runs per crank
    pub starter_crank_duration_ms: u32,
    /// Window to wait for the running signal after each crank
    pub start_monitor_duration_ms: u32,
    /// Pause between crank attempts
    pub retry_attempt_delay_ms: u32,

    // --- Engine management ---
    /// Time before releasing the choke once running
    pub choke_warmup_delay_ms: u32,
    /// Additional warm-up after choke release
    pub post_choke_warmup_delay_ms: u32,

    // --- Safety ---
    /// Grace period before a MANUAL start begins cranking
    pub manual_start_prep_delay_ms: u32,
    /// Time before switching the load onto the generator
    pub transfer_switch_delay_ms: u32,
    /// Granularity of cancellation checks (abort flag and mode drift)
    pub mode_change_check_interval_ms: u32,

    // --- Timing ---
    /// Main loop period (grid sampling, supervision)
    pub control_loop_interval_ms: u32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            default_mode: OperatingMode::Auto,
            max_start_attempts: 3,

            // Grid
            grid_outage_confirm_delay_ms: 10_000,
            grid_restore_confirm_delay_ms: 10_000,
            grid_monitor_debounce_ms: 10_000,

            // Start sequence
            power_stabilize_delay_ms: 2_000,
            choke_engage_delay_ms: 3_000,
            starter_crank_duration_ms: 3_000,
            start_monitor_duration_ms: 10_000,
            retry_attempt_delay_ms: 5_000,

            // Engine management
            choke_warmup_delay_ms: 3_000,
            post_choke_warmup_delay_ms: 5_000,

            // Safety
            manual_start_prep_delay_ms: 10_000,
            transfer_switch_delay_ms: 10_000,
            mode_change_check_interval_ms: 50,

            // Timing
            control_loop_interval_ms: 100, // 10 Hz
        }
    }
}

impl SystemConfig {
    /// Reject values that would break the control structure.
    ///
    /// Out-of-range values are refused rather than clamped.
    pub fn validate(&self) -> Result<()> {
        if self.max_start_attempts == 0 {
            return Err(Error::Config("max_start_attempts must be at least 1"));
        }
        if self.mode_change_check_interval_ms == 0 {
            return Err(Error::Config("mode_change_check_interval_ms must be non-zero"));
        }
        if self.starter_crank_duration_ms == 0 {
            return Err(Error::Config("starter_crank_duration_ms must be non-zero"));
        }
        if self.start_monitor_duration_ms == 0 {
            return Err(Error::Config("start_monitor_duration_ms must be non-zero"));
        }
        if self.control_loop_interval_ms == 0 {
            return Err(Error::Config("control_loop_interval_ms must be non-zero"));
        }
        if self.mode_change_check_interval_ms > self.start_monitor_duration_ms {
            return Err(Error::Config(
                "mode_change_check_interval_ms exceeds start_monitor_duration_ms",
            ));
        }
        Ok(())
    }

    /// Parse a JSON document and validate it.  Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|_| Error::Config("malformed JSON"))?;
        config.validate()?;
        Ok(config)
    }

    /// Worst-case blocking time of one `start()` call that ends in a timeout.
    pub fn worst_case_start_ms(&self) -> u64 {
        let cranks = u64::from(crate::fsm::sequencer::CRANKS_PER_START);
        u64::from(self.power_stabilize_delay_ms)
            + u64::from(self.choke_engage_delay_ms)
            + cranks
                * (u64::from(self.starter_crank_duration_ms)
                    + u64::from(self.start_monitor_duration_ms))
            + (cranks - 1) * u64::from(self.retry_attempt_delay_ms)
    }
}
