// Core module - Relay state machines, independent of real devices
pub mod clock;
pub mod control;
pub mod relay;

pub use clock::{Clock, ManualClock, SystemClock};
