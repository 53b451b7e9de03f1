//! Standby generator controller library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection.  Hardware reaches the core only through the port traits in
//! [`app::ports`]; the ESP-IDF binary wires real pins in `main.rs`.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod bridge;
pub mod config;
pub mod drivers;
pub mod error;
pub mod fsm;
pub mod grid;
pub mod mode;
pub mod pins;
pub mod safety;
