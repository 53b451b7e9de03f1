//! Application core: controller logic behind port traits.
//!
//! The sequencer does the timed work; this module adds the port traits it
//! is built on, the command/event vocabulary, and the [`service::AppService`]
//! that an accessory bridge or main loop talks to.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
