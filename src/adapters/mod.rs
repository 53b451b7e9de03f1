//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter     | Implements   | Connects to                         |
//! |-------------|--------------|-------------------------------------|
//! | `hardware`  | GeneratorIo  | embedded-hal GPIO pins (relays)     |
//! | `log_sink`  | EventSink    | `log` facade / serial output        |
//! | `mode`      | ModeSource   | shared atomic mode cell             |
//! | `time`      | DelayNs      | thread sleep, monotonic uptime      |

pub mod hardware;
pub mod log_sink;
pub mod mode;
pub mod time;
