//! Generator controller firmware: main entry point.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                   Adapters (outer ring)                    │
//! │  GpioAdapter (relays + running sense)   LogEventSink       │
//! │  SharedMode (atomic)   ThreadDelay   MonotonicClock        │
//! │                                                            │
//! │  ─────────────── Port Trait Boundary ───────────────       │
//! │                                                            │
//! │  ┌──────────────────────────────────────────────────────┐  │
//! │  │   AppService: Sequencer · GridMonitor · Supervisor   │  │
//! │  └──────────────────────────────────────────────────────┘  │
//! └────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::time::Duration;

use anyhow::Result;
use esp_idf_hal::gpio::{PinDriver, Pull};
use esp_idf_hal::peripherals::Peripherals;
use log::{info, warn};

use genctl::adapters::hardware::{GpioAdapter, Polarity};
use genctl::adapters::log_sink::{LogEventSink, banner};
use genctl::adapters::time::{MonotonicClock, ThreadDelay};
use genctl::app::commands::AppCommand;
use genctl::app::service::AppService;
use genctl::bridge::ModeSwitchBank;
use genctl::config::SystemConfig;
use genctl::pins;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    for line in banner(concat!("Generator Controller v", env!("CARGO_PKG_VERSION"))) {
        info!("{line}");
    }

    // ── 2. Configuration ──────────────────────────────────────
    let config = SystemConfig::default();
    config.validate()?;
    info!(
        "Config: {} start attempts, worst-case start {} ms",
        config.max_start_attempts,
        config.worst_case_start_ms()
    );

    // ── 3. GPIO ───────────────────────────────────────────────
    let peripherals = Peripherals::take()?;
    let gpio = peripherals.pins;

    let power = PinDriver::output(gpio.gpio25)?;
    let choke = PinDriver::output(gpio.gpio26)?;
    let starter = PinDriver::output(gpio.gpio27)?;
    let transfer = PinDriver::output(gpio.gpio14)?;
    let mut running = PinDriver::input(gpio.gpio33)?;
    running.set_pull(Pull::Up)?;
    let mut grid = PinDriver::input(gpio.gpio32)?;
    grid.set_pull(Pull::Up)?;

    // The typed gpioNN fields above must match the pin map.
    pins::check(power.pin(), pins::GENERATOR_POWER_GPIO, "power relay pin")?;
    pins::check(choke.pin(), pins::GENERATOR_CHOKE_GPIO, "choke relay pin")?;
    pins::check(starter.pin(), pins::GENERATOR_STARTER_GPIO, "starter relay pin")?;
    pins::check(transfer.pin(), pins::TRANSFER_SWITCH_GPIO, "transfer relay pin")?;
    pins::check(running.pin(), pins::GENERATOR_RUNNING_GPIO, "running sense pin")?;
    pins::check(grid.pin(), pins::GRID_MONITOR_GPIO, "grid sense pin")?;

    info!(
        "Pins: power={} choke={} starter={} transfer={} running={} grid={}",
        pins::GENERATOR_POWER_GPIO,
        pins::GENERATOR_CHOKE_GPIO,
        pins::GENERATOR_STARTER_GPIO,
        pins::TRANSFER_SWITCH_GPIO,
        pins::GENERATOR_RUNNING_GPIO,
        pins::GRID_MONITOR_GPIO,
    );

    // Running sense is pulled up and pulled low by the generator.
    let io = GpioAdapter::new(power, choke, starter, transfer, running)
        .with_running_polarity(Polarity::ActiveLow);

    // ── 4. Application service ────────────────────────────────
    let loop_period = Duration::from_millis(u64::from(config.control_loop_interval_ms));
    let mut app = AppService::new(config, io, ThreadDelay);
    let mut sink = LogEventSink::new();
    let mut switches = ModeSwitchBank::new(app.mode());
    let clock = MonotonicClock::new();

    // Boot into a known safe state whatever the relays latched at reset.
    app.handle_command(AppCommand::StopGenerator, &mut sink)?;

    info!("System ready. Entering control loop.");

    // ── 5. Control loop ───────────────────────────────────────
    loop {
        let grid_present = grid.is_high();
        app.tick(clock.uptime_ms(), grid_present, &mut sink);

        // The accessory bridge reflects whatever mode the core ended up in.
        switches.sync(app.mode());
        if app.fault_flags() != 0 {
            warn!("Output faults active: 0b{:08b}", app.fault_flags());
        }

        std::thread::sleep(loop_period);
    }
}
