//! serelay Library
//!
//! Minimal serial terminal: duplexes stdin/stdout with a character device,
//! with control over line speed, DTR/RTS pulses, breaks and transmit pacing.

pub mod cli;
pub mod core;
pub mod domain;
pub mod infrastructure;

pub use crate::domain::error::{RelayError, RelayResult};
pub use crate::domain::config::RelayConfig;
pub use crate::core::relay::{Relay, RelayExit, RelayOptions};
