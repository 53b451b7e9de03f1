//! Actuator drivers.

pub mod transfer_switch;
